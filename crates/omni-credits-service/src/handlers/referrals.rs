//! Referral code and statistics handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use omni_credits_core::{
    generate_referral_code, Referral, ReferralRejection, ReferralStats,
    REFERRAL_CODE_MAX_ATTEMPTS,
};
use omni_credits_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Referral code response.
#[derive(Debug, Serialize)]
pub struct ReferralCodeResponse {
    /// The user's referral code.
    pub referral_code: String,
}

/// Get the current user's referral code, generating one on first request.
///
/// Generation retries on collision up to a fixed budget before giving up
/// with `code_generation_exhausted`.
pub async fn get_referral_code(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ReferralCodeResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    if let Some(code) = account.referral_code {
        return Ok(Json(ReferralCodeResponse {
            referral_code: code,
        }));
    }

    for attempt in 1..=REFERRAL_CODE_MAX_ATTEMPTS {
        let candidate = generate_referral_code();

        match state.store.assign_referral_code(&auth.user_id, &candidate) {
            Ok(()) => {
                tracing::info!(
                    user_id = %auth.user_id,
                    code = %candidate,
                    "Referral code issued"
                );
                return Ok(Json(ReferralCodeResponse {
                    referral_code: candidate,
                }));
            }
            Err(StoreError::ReferralCodeTaken { code }) => {
                tracing::debug!(
                    user_id = %auth.user_id,
                    code = %code,
                    attempt = %attempt,
                    "Referral code collision, retrying"
                );
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::error!(
        user_id = %auth.user_id,
        attempts = %REFERRAL_CODE_MAX_ATTEMPTS,
        "Referral code generation exhausted"
    );
    Err(ApiError::Referral(ReferralRejection::CodeGenerationExhausted))
}

/// One referral in the stats detail list.
#[derive(Debug, Serialize)]
pub struct ReferralDetail {
    /// The referred user.
    pub referred_id: String,
    /// Credits earned from this referral.
    pub bonus_credits: i64,
    /// Referral status.
    pub status: String,
    /// When the referral was recorded.
    pub created_at: String,
}

impl From<&Referral> for ReferralDetail {
    fn from(referral: &Referral) -> Self {
        Self {
            referred_id: referral.referred_id.to_string(),
            bonus_credits: referral.bonus_credits,
            status: format!("{:?}", referral.status).to_lowercase(),
            created_at: referral.created_at.to_rfc3339(),
        }
    }
}

/// Referral stats response.
#[derive(Debug, Serialize)]
pub struct ReferralStatsResponse {
    /// The user's referral code, if issued.
    pub referral_code: Option<String>,
    /// Total referral rows.
    pub total_referrals: u64,
    /// Referrals whose bonus was granted.
    pub completed_referrals: u64,
    /// Total credits earned from referrals.
    pub credits_earned: i64,
    /// Per-referral detail.
    pub referrals: Vec<ReferralDetail>,
}

/// Get the current user's referral statistics. Read-only.
pub async fn get_referral_stats(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ReferralStatsResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let referrals = state.store.list_referrals_by_referrer(&auth.user_id)?;
    let stats = ReferralStats::aggregate(account.referral_code, &referrals);

    Ok(Json(ReferralStatsResponse {
        referral_code: stats.referral_code,
        total_referrals: stats.total_referrals,
        completed_referrals: stats.completed_referrals,
        credits_earned: stats.credits_earned,
        referrals: referrals.iter().map(ReferralDetail::from).collect(),
    }))
}
