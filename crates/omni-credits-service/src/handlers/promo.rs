//! Promo code validation, redemption and administrative creation.
//!
//! Validation and redemption outcomes are business results the UI branches
//! on, so they are returned as 200 responses carrying a stable `error_code`
//! plus a message localized from the fixed per-locale table.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use omni_credits_core::{
    normalize_code, CreditTransaction, PromoCode, PromoKind, PromoRedemption, PromoRejection,
};
use omni_credits_store::{Store, StoreError};

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::locale::{self, Locale};
use crate::state::AppState;

/// Validate request.
#[derive(Debug, Deserialize)]
pub struct ValidatePromoRequest {
    /// The code to validate.
    pub code: String,
    /// Response language tag (default: en).
    pub lang: Option<String>,
}

/// Validate response.
#[derive(Debug, Serialize)]
pub struct ValidatePromoResponse {
    /// Whether the code can be redeemed by this user.
    pub valid: bool,
    /// Code kind, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_type: Option<String>,
    /// Code value, when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
    /// Stable error code, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Localized message, when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl ValidatePromoResponse {
    fn rejected(rejection: PromoRejection, lang: Locale) -> Self {
        Self {
            valid: false,
            promo_type: None,
            value: None,
            error_code: Some(rejection.error_code()),
            message: Some(locale::message(rejection.error_code(), lang)),
        }
    }
}

/// Validate a promo code for the current user.
pub async fn validate_promo(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<ValidatePromoRequest>,
) -> Result<Json<ValidatePromoResponse>, ApiError> {
    let lang = Locale::parse(body.lang.as_deref());

    let outcome = run_validation(&state, &auth, &body.code, Utc::now())?;

    match outcome {
        Ok(promo) => Ok(Json(ValidatePromoResponse {
            valid: true,
            promo_type: Some(promo.kind.as_str().to_string()),
            value: Some(promo.value),
            error_code: None,
            message: None,
        })),
        Err(rejection) => Ok(Json(ValidatePromoResponse::rejected(rejection, lang))),
    }
}

/// Run the ordered validation for one (code, user) pair.
///
/// Outer error = storage failure; inner error = business rejection.
fn run_validation(
    state: &AppState,
    auth: &AuthUser,
    code: &str,
    now: DateTime<Utc>,
) -> Result<Result<PromoCode, PromoRejection>, ApiError> {
    let Some(promo) = state.store.get_promo_code(code)? else {
        return Ok(Err(PromoRejection::InvalidCode));
    };

    let already_used = state.store.get_redemption(&auth.user_id, code)?.is_some();

    match promo.validate(now, already_used) {
        Ok(()) => Ok(Ok(promo)),
        Err(rejection) => Ok(Err(rejection)),
    }
}

/// Redeem request.
#[derive(Debug, Deserialize)]
pub struct RedeemPromoRequest {
    /// The code to redeem.
    pub code: String,
    /// Response language tag (default: en).
    pub lang: Option<String>,
}

/// Redeem response.
#[derive(Debug, Serialize)]
pub struct RedeemPromoResponse {
    /// Whether the redemption was applied.
    pub success: bool,
    /// Credits granted, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credits_added: Option<i64>,
    /// New balance, on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balance_credits: Option<i64>,
    /// Stable error code, on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<&'static str>,
    /// Localized message, on rejection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl RedeemPromoResponse {
    fn rejected(rejection: PromoRejection, lang: Locale) -> Self {
        Self {
            success: false,
            credits_added: None,
            balance_credits: None,
            error_code: Some(rejection.error_code()),
            message: Some(locale::message(rejection.error_code(), lang)),
        }
    }
}

/// Redeem a credits promo code for the current user.
///
/// Validation is re-run inside the store's atomic operation; the validate
/// endpoint's earlier answer is never trusted.
pub async fn redeem_promo(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<RedeemPromoRequest>,
) -> Result<Json<RedeemPromoResponse>, ApiError> {
    let lang = Locale::parse(body.lang.as_deref());

    // Pre-check so we can build the transaction record; the store re-checks.
    let promo = match run_validation(&state, &auth, &body.code, Utc::now())? {
        Ok(promo) => promo,
        Err(rejection) => return Ok(Json(RedeemPromoResponse::rejected(rejection, lang))),
    };

    if promo.kind != PromoKind::Credits {
        return Ok(Json(RedeemPromoResponse::rejected(
            PromoRejection::NotCreditsCode,
            lang,
        )));
    }

    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let tx = CreditTransaction::bonus(
        auth.user_id,
        promo.value,
        account.balance_credits + promo.value,
        format!("Promo code {}", promo.code),
        serde_json::json!({ "promo_code": promo.code }),
    );
    let redemption = PromoRedemption {
        code: promo.code.clone(),
        user_id: auth.user_id,
        credits_awarded: promo.value,
        redeemed_at: Utc::now(),
    };

    let balance = match state
        .store
        .redeem_promo(&auth.user_id, &body.code, &tx, &redemption)
    {
        Ok(balance) => balance,
        Err(StoreError::PromoRejected(rejection)) => {
            return Ok(Json(RedeemPromoResponse::rejected(rejection, lang)));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        user_id = %auth.user_id,
        code = %promo.code,
        credits_added = %promo.value,
        new_balance = %balance,
        "Promo code redeemed"
    );

    Ok(Json(RedeemPromoResponse {
        success: true,
        credits_added: Some(promo.value),
        balance_credits: Some(balance),
        error_code: None,
        message: None,
    }))
}

/// Administrative create-code request.
#[derive(Debug, Deserialize)]
pub struct CreatePromoRequest {
    /// The code string (stored normalized).
    pub code: String,
    /// What the code grants.
    pub kind: PromoKind,
    /// Credits, percent or minor currency units depending on kind.
    pub value: i64,
    /// Optional expiry.
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional redemption cap.
    pub max_uses: Option<u32>,
}

/// Administrative endpoint to create a promo code.
pub async fn create_promo(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<CreatePromoRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.value <= 0 {
        return Err(ApiError::InvalidAmount("value must be positive".into()));
    }

    let normalized = normalize_code(&body.code);
    if normalized.is_empty() {
        return Err(ApiError::BadRequest("code must not be empty".into()));
    }

    if state.store.get_promo_code(&normalized)?.is_some() {
        return Err(ApiError::Conflict(format!(
            "Promo code {normalized} already exists"
        )));
    }

    let mut promo = PromoCode::new(&body.code, body.kind, body.value);
    promo.expires_at = body.expires_at;
    promo.max_uses = body.max_uses;

    state.store.put_promo_code(&promo)?;

    tracing::info!(
        code = %promo.code,
        kind = %promo.kind.as_str(),
        value = %promo.value,
        created_by = %auth.service_name,
        "Promo code created"
    );

    Ok(Json(serde_json::json!({ "code": promo.code })))
}
