//! Stripe payment integration.
//!
//! Checkout session creation for credit package purchases and webhook
//! signature verification.

pub mod client;
pub mod types;

pub use client::{StripeClient, StripeError};
pub use types::{CheckoutSession, Customer};
