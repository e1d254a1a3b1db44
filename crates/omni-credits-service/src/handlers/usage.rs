//! Usage estimate, charge and balance-check handlers.
//!
//! The estimate and the final charge both price through
//! `PricingConfig::quote`, so a previewed cost and the charged cost can
//! never diverge for the same measured quantity.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use omni_credits_core::{CreditTransaction, ToolKind, UsageLog};
use omni_credits_store::{Store, StoreError};

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Estimate request.
#[derive(Debug, Deserialize)]
pub struct EstimateRequest {
    /// Which tool the operation uses.
    pub tool: ToolKind,
    /// Measured work quantity in the tool's unit.
    pub quantity: f64,
}

/// Estimate response.
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    /// Base cost before fees.
    pub base_credits: i64,
    /// Service fee.
    pub service_fee_credits: i64,
    /// Total that would be charged.
    pub total_credits: i64,
    /// Rough processing time in seconds.
    pub estimated_seconds: u64,
}

/// Pre-flight cost estimate. No side effects.
pub async fn estimate(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<EstimateRequest>,
) -> Result<Json<EstimateResponse>, ApiError> {
    if !state
        .rate_limiter
        .check(&format!("estimate:{}", auth.user_id))
    {
        return Err(ApiError::RateLimited);
    }

    let quote = state.config.pricing.quote(body.tool, body.quantity);
    let estimated_seconds = state.config.pricing.estimate_seconds(body.tool, body.quantity);

    Ok(Json(EstimateResponse {
        base_credits: quote.base_credits,
        service_fee_credits: quote.service_fee_credits,
        total_credits: quote.total_credits,
        estimated_seconds,
    }))
}

/// Charge request from a tool backend, after the operation succeeded.
#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    /// Unique event ID for idempotency.
    pub event_id: String,
    /// User ID being charged.
    pub user_id: String,
    /// Which tool was used.
    pub tool: ToolKind,
    /// Final measured quantity (provider-reported where available).
    pub quantity: f64,
    /// Input size in bytes.
    #[serde(default)]
    pub input_size: u64,
    /// Output size in bytes.
    #[serde(default)]
    pub output_size: u64,
    /// Additional metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Charge response.
#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    /// Whether the charge was recorded.
    pub success: bool,
    /// Credits deducted.
    pub credits_used: i64,
    /// New balance after deduction.
    pub balance_credits: i64,
    /// Transaction ID.
    pub transaction_id: String,
}

/// Record a completed metered operation and debit its cost.
///
/// The cost is always computed server-side from (tool, quantity); a
/// caller-supplied figure is never trusted. A failed debit here means the
/// user already received their result without being charged, so the failure
/// is logged for monitoring before it is returned.
pub async fn charge(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<ChargeRequest>,
) -> Result<Json<ChargeResponse>, ApiError> {
    tracing::debug!(
        service = %auth.service_name,
        event_id = %body.event_id,
        user_id = %body.user_id,
        tool = %body.tool.as_str(),
        "Processing usage charge"
    );

    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let quote = state.config.pricing.quote(body.tool, body.quantity);

    // Current balance for the transaction record
    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let new_balance = account.balance_credits - quote.total_credits;

    let description = format!(
        "{} usage: {} {}(s) via {}",
        body.tool.as_str(),
        body.quantity,
        body.tool.unit(),
        auth.service_name
    );
    let tx_metadata = serde_json::json!({
        "tool": body.tool.as_str(),
        "event_id": body.event_id,
        "base_credits": quote.base_credits,
        "service_fee_credits": quote.service_fee_credits,
    });
    let tx = CreditTransaction::usage(
        user_id,
        quote.total_credits,
        new_balance,
        description,
        tx_metadata,
    );

    let log = UsageLog::new(
        body.event_id.clone(),
        user_id,
        body.tool,
        body.quantity,
        quote.total_credits,
    )
    .with_sizes(body.input_size, body.output_size)
    .with_metadata(body.metadata);

    let balance = match state.store.debit_usage(&log, &tx) {
        Ok(balance) => balance,
        Err(e @ StoreError::InsufficientCredits { .. }) => {
            // The external operation already completed; this billing gap
            // cannot be rolled back and must be visible in the logs.
            tracing::warn!(
                service = %auth.service_name,
                event_id = %body.event_id,
                user_id = %user_id,
                required = %quote.total_credits,
                "Usage debit failed after completed operation"
            );
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        service = %auth.service_name,
        event_id = %body.event_id,
        user_id = %user_id,
        credits_used = %quote.total_credits,
        new_balance = %balance,
        "Usage charged"
    );

    Ok(Json(ChargeResponse {
        success: true,
        credits_used: quote.total_credits,
        balance_credits: balance,
        transaction_id: tx.id.to_string(),
    }))
}

/// Balance check request.
#[derive(Debug, Deserialize)]
pub struct CheckBalanceRequest {
    /// User ID to check.
    pub user_id: String,
    /// Required amount in credits.
    pub required_credits: i64,
}

/// Balance check response.
#[derive(Debug, Serialize)]
pub struct CheckBalanceResponse {
    /// Whether the user has sufficient balance.
    pub sufficient: bool,
    /// Current balance.
    pub balance_credits: i64,
    /// Required amount.
    pub required_credits: i64,
}

/// Authorization gate: check if a user can afford a prospective operation.
///
/// An unknown user is treated as a zero balance, never an error. The actual
/// debit re-validates, so this check is advisory.
pub async fn check_balance(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Json(body): Json<CheckBalanceRequest>,
) -> Result<Json<CheckBalanceResponse>, ApiError> {
    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let balance_credits = state
        .store
        .get_account(&user_id)?
        .map_or(0, |account| account.balance_credits);

    Ok(Json(CheckBalanceResponse {
        sufficient: balance_credits >= body.required_credits,
        balance_credits,
        required_credits: body.required_credits,
    }))
}
