//! Credit balance, transaction history, packages and top-up handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use omni_credits_core::{find_package, CreditTransaction, TransactionKind, CREDIT_PACKAGES};
use omni_credits_store::Store;

use crate::auth::{AuthUser, ServiceAuth};
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Current balance in credits.
    pub balance_credits: i64,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(BalanceResponse {
        balance_credits: account.balance_credits,
    }))
}

/// Transaction list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListTransactionsQuery {
    /// Maximum number of transactions to return (default: 50).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Transaction response.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// Transaction ID.
    pub id: String,
    /// Amount in credits (positive = credit, negative = debit).
    pub amount_credits: i64,
    /// Transaction kind.
    pub kind: String,
    /// Balance after this transaction.
    pub balance_after_credits: i64,
    /// Description.
    pub description: String,
    /// Timestamp.
    pub created_at: String,
}

impl From<&CreditTransaction> for TransactionResponse {
    fn from(tx: &CreditTransaction) -> Self {
        Self {
            id: tx.id.to_string(),
            amount_credits: tx.amount_credits,
            kind: tx.kind.as_str().to_string(),
            balance_after_credits: tx.balance_after_credits,
            description: tx.description.clone(),
            created_at: tx.created_at.to_rfc3339(),
        }
    }
}

/// List transactions response.
#[derive(Debug, Serialize)]
pub struct ListTransactionsResponse {
    /// Transactions (newest first).
    pub transactions: Vec<TransactionResponse>,
    /// Whether there are more transactions.
    pub has_more: bool,
}

/// List transaction history.
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<Json<ListTransactionsResponse>, ApiError> {
    // Verify account exists
    state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let transactions =
        state
            .store
            .list_transactions_by_user(&auth.user_id, limit + 1, query.offset)?;

    let has_more = transactions.len() > limit;
    let transactions: Vec<_> = transactions
        .iter()
        .take(limit)
        .map(TransactionResponse::from)
        .collect();

    Ok(Json(ListTransactionsResponse {
        transactions,
        has_more,
    }))
}

/// Package catalog entry response.
#[derive(Debug, Serialize)]
pub struct PackageResponse {
    /// Package id.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Credits granted.
    pub credits: i64,
    /// Price in minor currency units.
    pub price_cents: i64,
    /// ISO currency code.
    pub currency: &'static str,
    /// Highlighted in the UI.
    pub popular: bool,
}

/// List the static credit package catalog.
pub async fn list_packages() -> Json<Vec<PackageResponse>> {
    Json(
        CREDIT_PACKAGES
            .iter()
            .map(|p| PackageResponse {
                id: p.id,
                name: p.name,
                credits: p.credits,
                price_cents: p.price_cents,
                currency: p.currency,
                popular: p.popular,
            })
            .collect(),
    )
}

/// Purchase credits request.
#[derive(Debug, Deserialize)]
pub struct PurchaseCreditsRequest {
    /// Catalog package to buy.
    pub package_id: String,
}

/// Purchase credits response.
#[derive(Debug, Serialize)]
pub struct PurchaseCreditsResponse {
    /// Stripe checkout session URL.
    pub checkout_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Initiate a credit package purchase via Stripe.
pub async fn purchase_credits(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<PurchaseCreditsRequest>,
) -> Result<Json<PurchaseCreditsResponse>, ApiError> {
    let package = find_package(&body.package_id)
        .ok_or_else(|| ApiError::BadRequest(format!("Unknown package: {}", body.package_id)))?;

    // Verify Stripe is configured
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

    // Verify account exists
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let success_url = format!(
        "{}/billing/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.frontend_url
    );
    let cancel_url = format!("{}/billing/cancel", state.config.frontend_url);

    let session = stripe
        .create_checkout_session(
            account.stripe_customer_id.as_deref(),
            &auth.user_id.to_string(),
            package,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create Stripe checkout session");
            ApiError::ExternalService(format!("Failed to create checkout session: {e}"))
        })?;

    let checkout_url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Stripe returned no checkout URL".into()))?;

    tracing::info!(
        user_id = %auth.user_id,
        package_id = %package.id,
        session_id = %session.id,
        "Stripe checkout session created"
    );

    Ok(Json(PurchaseCreditsResponse {
        checkout_url,
        session_id: session.id,
    }))
}

/// Administrative add-credits request.
#[derive(Debug, Deserialize)]
pub struct AddCreditsRequest {
    /// User ID to add credits to.
    pub user_id: String,
    /// Amount in credits; must be positive.
    pub amount_credits: i64,
    /// Transaction kind, `purchase` or `bonus` (default: `bonus`).
    #[serde(default = "default_add_kind")]
    pub kind: String,
    /// Reason for the grant.
    pub description: String,
}

fn default_add_kind() -> String {
    "bonus".to_string()
}

/// Add-credits response.
#[derive(Debug, Serialize)]
pub struct AddCreditsResponse {
    /// New balance after the grant.
    pub balance_credits: i64,
    /// The recorded transaction.
    pub transaction_id: String,
}

/// Administrative endpoint to add credits (support grants, compensations).
pub async fn add_credits(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<AddCreditsRequest>,
) -> Result<Json<AddCreditsResponse>, ApiError> {
    if body.amount_credits <= 0 {
        return Err(ApiError::InvalidAmount(
            "amount_credits must be positive".into(),
        ));
    }

    let kind = match body.kind.as_str() {
        "purchase" => TransactionKind::Purchase,
        "bonus" => TransactionKind::Bonus,
        other => {
            return Err(ApiError::BadRequest(format!(
                "kind must be purchase or bonus, got {other}"
            )))
        }
    };

    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let account = state
        .store
        .get_account(&user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let new_balance = account.balance_credits + body.amount_credits;
    let metadata = serde_json::json!({ "granted_by": auth.service_name });
    let tx = match kind {
        TransactionKind::Purchase => CreditTransaction::purchase(
            user_id,
            body.amount_credits,
            new_balance,
            body.description.clone(),
            metadata,
        ),
        _ => CreditTransaction::bonus(
            user_id,
            body.amount_credits,
            new_balance,
            body.description.clone(),
            metadata,
        ),
    };

    let balance = state.store.add_credits(&user_id, body.amount_credits, &tx)?;

    tracing::info!(
        user_id = %user_id,
        amount_credits = %body.amount_credits,
        kind = %kind.as_str(),
        reason = %body.description,
        new_balance = %balance,
        "Credits added"
    );

    Ok(Json(AddCreditsResponse {
        balance_credits: balance,
        transaction_id: tx.id.to_string(),
    }))
}
