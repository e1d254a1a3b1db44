//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, credits, health, promo, referrals, usage, webhooks};
use crate::state::AppState;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
/// - `GET /v1/credits/packages` - Static credit package catalog
///
/// ## Accounts (user JWT auth)
/// - `POST /v1/accounts` - Create/register account (signup bonus, referral)
/// - `GET /v1/accounts/me` - Get current user's account
/// - `DELETE /v1/accounts/me` - Delete current user's account
///
/// ## Credits (user JWT auth)
/// - `GET /v1/credits/balance` - Get current balance
/// - `GET /v1/credits/transactions` - List transaction history
/// - `POST /v1/credits/purchase` - Start a package checkout
///
/// ## Credits (service API key auth)
/// - `POST /v1/credits/add` - Administrative credit grant
///
/// ## Usage
/// - `POST /v1/usage/estimate` - Pre-flight cost estimate (user auth)
/// - `POST /v1/usage/charge` - Debit a completed operation (service auth)
/// - `POST /v1/usage/check` - Balance authorization gate (service auth)
///
/// ## Promo
/// - `POST /v1/promo/validate` / `POST /v1/promo/redeem` (user auth)
/// - `POST /v1/promo/codes` - Create a code (service auth)
///
/// ## Referrals (user JWT auth)
/// - `GET /v1/referrals/code` / `GET /v1/referrals/stats`
///
/// ## Webhooks (signature verification)
/// - `POST /webhooks/payments` - Payment provider webhooks
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    Router::new()
        // Health (public)
        .route("/health", get(health::health))
        // Accounts
        .route("/v1/accounts", post(accounts::create_account))
        .route("/v1/accounts/me", get(accounts::get_account))
        .route("/v1/accounts/me", delete(accounts::delete_account))
        // Credits
        .route("/v1/credits/balance", get(credits::get_balance))
        .route("/v1/credits/transactions", get(credits::list_transactions))
        .route("/v1/credits/packages", get(credits::list_packages))
        .route("/v1/credits/purchase", post(credits::purchase_credits))
        .route("/v1/credits/add", post(credits::add_credits))
        // Usage
        .route("/v1/usage/estimate", post(usage::estimate))
        .route("/v1/usage/charge", post(usage::charge))
        .route("/v1/usage/check", post(usage::check_balance))
        // Promo codes
        .route("/v1/promo/validate", post(promo::validate_promo))
        .route("/v1/promo/redeem", post(promo::redeem_promo))
        .route("/v1/promo/codes", post(promo::create_promo))
        // Referrals
        .route("/v1/referrals/code", get(referrals::get_referral_code))
        .route("/v1/referrals/stats", get(referrals::get_referral_stats))
        // Webhooks
        .route("/webhooks/payments", post(webhooks::payment_webhook))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
