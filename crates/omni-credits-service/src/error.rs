//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use omni_credits_core::{PromoRejection, ReferralRejection};

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Amount must be positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Insufficient credits.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance.
        balance: i64,
        /// Required amount.
        required: i64,
    },

    /// Duplicate usage event (idempotency).
    #[error("duplicate event: {0}")]
    DuplicateEvent(String),

    /// Webhook signature did not verify.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Too many requests for a rate-limited endpoint.
    #[error("rate limit exceeded")]
    RateLimited,

    /// Promo rejection that escaped the handler's outcome branching.
    #[error("promo rejected: {0}")]
    Promo(#[from] PromoRejection),

    /// Referral operation rejected.
    #[error("referral rejected: {0}")]
    Referral(#[from] ReferralRejection),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// External service error.
    #[error("external service error: {0}")]
    ExternalService(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InvalidAmount(msg) => {
                (StatusCode::BAD_REQUEST, "invalid_amount", msg.clone(), None)
            }
            Self::InsufficientCredits { balance, required } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_credits",
                self.to_string(),
                Some(serde_json::json!({
                    "balance": balance,
                    "required": required
                })),
            ),
            Self::DuplicateEvent(id) => (
                StatusCode::CONFLICT,
                "duplicate_event",
                format!("Event {id} already processed"),
                None,
            ),
            Self::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                self.to_string(),
                None,
            ),
            Self::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                self.to_string(),
                None,
            ),
            Self::Promo(rejection) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                rejection.error_code(),
                rejection.to_string(),
                None,
            ),
            Self::Referral(rejection) => {
                let status = match rejection {
                    ReferralRejection::CodeGenerationExhausted => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                    ReferralRejection::SelfReferral | ReferralRejection::AlreadyReferred => {
                        StatusCode::CONFLICT
                    }
                };
                (status, rejection.error_code(), rejection.to_string(), None)
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                "external_service_error",
                msg.clone(),
                None,
            ),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<omni_credits_store::StoreError> for ApiError {
    fn from(err: omni_credits_store::StoreError) -> Self {
        use omni_credits_store::StoreError;

        match err {
            StoreError::NotFound => Self::NotFound("Resource not found".into()),
            StoreError::InsufficientCredits { balance, required } => {
                Self::InsufficientCredits { balance, required }
            }
            StoreError::DuplicateEvent { event_id } => Self::DuplicateEvent(event_id),
            StoreError::DuplicateSession { session_id } => {
                Self::Conflict(format!("Payment session {session_id} already processed"))
            }
            StoreError::PromoRejected(rejection) => Self::Promo(rejection),
            StoreError::AlreadyReferred => Self::Referral(ReferralRejection::AlreadyReferred),
            StoreError::ReferralCodeTaken { code } => {
                Self::Conflict(format!("Referral code {code} already taken"))
            }
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
