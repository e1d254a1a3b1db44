//! Core types and utilities for omni-credits.
//!
//! This crate provides the foundational types used throughout the omni-credits
//! platform:
//!
//! - **Identifiers**: `UserId`, `TransactionId`
//! - **Accounts**: `Account` and the signup/referral bonus constants
//! - **Ledger**: `CreditTransaction`, `TransactionKind`
//! - **Pricing**: `PricingConfig`, `ToolKind`, `CostQuote`
//! - **Usage**: `UsageLog`
//! - **Promo**: `PromoCode`, `PromoRedemption`, `PromoRejection`
//! - **Referrals**: `Referral`, `ReferralStats`, `ReferralRejection`
//! - **Packages**: the static `CreditPackage` catalog
//!
//! # Credit Unit
//!
//! Balances and charges are whole credits stored as `i64`; fractional credits
//! do not exist. Pricing rounds up to the next whole credit per operation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod ids;
pub mod ledger;
pub mod packages;
pub mod payment;
pub mod pricing;
pub mod promo;
pub mod referral;
pub mod usage;

pub use account::{Account, REFERRAL_BONUS_CREDITS, SIGNUP_BONUS_CREDITS};
pub use ids::{IdError, TransactionId, UserId};
pub use ledger::{CreditTransaction, TransactionKind};
pub use packages::{find_package, CreditPackage, CREDIT_PACKAGES};
pub use payment::PaymentSession;
pub use pricing::{CostQuote, PricingConfig, ToolKind, ToolRate, SERVICE_FEE_RATIO};
pub use promo::{normalize_code, PromoCode, PromoKind, PromoRedemption, PromoRejection};
pub use referral::{
    generate_referral_code, Referral, ReferralRejection, ReferralStats, ReferralStatus,
    REFERRAL_CODE_MAX_ATTEMPTS, REFERRAL_CODE_PREFIX,
};
pub use usage::UsageLog;
