//! Omni-Credits HTTP API Service.
//!
//! This crate provides the HTTP API for the omni-credits service, including:
//!
//! - Account management with signup and referral bonuses
//! - Credit balance, transaction history and package purchases
//! - Usage estimates, authorization checks and charges
//! - Promo code validation and redemption
//! - Payment provider webhooks
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **User JWT tokens** - For end-user requests (dashboard, tools UI)
//! 2. **Service API keys** - For service-to-service requests (tool backends)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod locale;
pub mod rate_limit;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use rate_limit::{InMemoryRateLimiter, NoopRateLimiter, RateLimiter};
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
