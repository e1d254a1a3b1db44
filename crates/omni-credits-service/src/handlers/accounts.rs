//! Account management handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use omni_credits_core::{
    Account, CreditTransaction, Referral, UserId, REFERRAL_BONUS_CREDITS, SIGNUP_BONUS_CREDITS,
};
use omni_credits_store::{Store, StoreError};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance in credits.
    pub balance_credits: i64,
    /// Lifetime purchased credits.
    pub lifetime_purchased_credits: i64,
    /// Lifetime granted credits.
    pub lifetime_granted_credits: i64,
    /// Lifetime used credits.
    pub lifetime_used_credits: i64,
    /// The user's referral code, if issued.
    pub referral_code: Option<String>,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            balance_credits: account.balance_credits,
            lifetime_purchased_credits: account.lifetime_purchased_credits,
            lifetime_granted_credits: account.lifetime_granted_credits,
            lifetime_used_credits: account.lifetime_used_credits,
            referral_code: account.referral_code.clone(),
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Create account request.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// Optional email (synced from the identity provider).
    pub email: Option<String>,
    /// Optional display name.
    pub name: Option<String>,
    /// Referral code of the inviting user, if the signup came through one.
    pub referral_code: Option<String>,
}

/// Create or register a new account.
///
/// Signup grants the welcome bonus atomically with account creation. A
/// referral code, when present and valid, additionally rewards both parties;
/// referral problems are logged and never fail the signup itself.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    // Check if account already exists
    if state.store.get_account(&auth.user_id)?.is_some() {
        return Err(ApiError::Conflict("Account already exists".into()));
    }

    let mut account = Account::new(auth.user_id);
    account.balance_credits = SIGNUP_BONUS_CREDITS;
    account.lifetime_granted_credits = SIGNUP_BONUS_CREDITS;

    // Create customer in Stripe if configured
    if let Some(stripe) = &state.stripe {
        let email = body.email.as_deref().or(auth.email.as_deref());
        let name = body
            .name
            .clone()
            .unwrap_or_else(|| format!("User {}", auth.user_id));

        match stripe
            .create_customer(&auth.user_id.to_string(), email, Some(&name))
            .await
        {
            Ok(customer) => {
                tracing::info!(
                    user_id = %auth.user_id,
                    stripe_id = %customer.id,
                    "Stripe customer created"
                );
                account.stripe_customer_id = Some(customer.id);
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %auth.user_id,
                    error = %e,
                    "Failed to create Stripe customer - continuing without"
                );
            }
        }
    }

    let welcome_tx = CreditTransaction::bonus(
        auth.user_id,
        SIGNUP_BONUS_CREDITS,
        SIGNUP_BONUS_CREDITS,
        "Welcome bonus".into(),
        serde_json::Value::Null,
    );

    state.store.create_account(&account, &welcome_tx)?;

    tracing::info!(
        user_id = %auth.user_id,
        welcome_bonus = %SIGNUP_BONUS_CREDITS,
        "Account created"
    );

    if let Some(code) = &body.referral_code {
        apply_signup_referral(&state, auth.user_id, code);
    }

    // Re-read so the response reflects any referral bonus
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::Internal("Account vanished after creation".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Apply the referral bonus for a signup that carried a referral code.
///
/// Rejections are expected business outcomes here (unknown code, self
/// referral, pair already rewarded) and must not fail the signup.
fn apply_signup_referral(state: &AppState, referred_id: UserId, code: &str) {
    let referrer_id = match state.store.get_user_by_referral_code(code) {
        Ok(Some(id)) => id,
        Ok(None) => {
            tracing::warn!(code = %code, referred = %referred_id, "Unknown referral code at signup");
            return;
        }
        Err(e) => {
            tracing::error!(error = %e, "Referral code lookup failed");
            return;
        }
    };

    if referrer_id == referred_id {
        tracing::warn!(user_id = %referred_id, "Self referral attempt ignored");
        return;
    }

    let referrer_balance = state
        .store
        .get_account(&referrer_id)
        .ok()
        .flatten()
        .map_or(0, |a| a.balance_credits);

    let referral = Referral::completed(referrer_id, referred_id, REFERRAL_BONUS_CREDITS);
    let referrer_tx = CreditTransaction::bonus(
        referrer_id,
        REFERRAL_BONUS_CREDITS,
        referrer_balance + REFERRAL_BONUS_CREDITS,
        "Referral bonus".into(),
        serde_json::json!({ "referred": referred_id.to_string() }),
    );
    let referred_tx = CreditTransaction::bonus(
        referred_id,
        REFERRAL_BONUS_CREDITS,
        SIGNUP_BONUS_CREDITS + REFERRAL_BONUS_CREDITS,
        "Referral welcome bonus".into(),
        serde_json::json!({ "referrer": referrer_id.to_string() }),
    );

    match state.store.apply_referral(&referral, &referrer_tx, &referred_tx) {
        Ok((referrer_new, referred_new)) => {
            tracing::info!(
                referrer = %referrer_id,
                referred = %referred_id,
                bonus = %REFERRAL_BONUS_CREDITS,
                referrer_balance = %referrer_new,
                referred_balance = %referred_new,
                "Referral bonus applied"
            );
        }
        Err(StoreError::AlreadyReferred) => {
            tracing::warn!(
                referrer = %referrer_id,
                referred = %referred_id,
                "Referral pair already rewarded"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "Referral bonus application failed");
        }
    }
}

/// Get the current user's account.
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(AccountResponse::from(&account)))
}

/// Delete the current user's account.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_account(&auth.user_id)?;

    tracing::info!(user_id = %auth.user_id, "Account deleted");

    Ok(Json(serde_json::json!({ "deleted": true })))
}
