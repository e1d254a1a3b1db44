//! Account types for omni-credits.
//!
//! This module defines the account structure holding the credit balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Credits granted to every new account on signup.
pub const SIGNUP_BONUS_CREDITS: i64 = 10;

/// Credits granted to both parties of a completed referral.
pub const REFERRAL_BONUS_CREDITS: i64 = 25;

/// A credit account for a user.
///
/// The account tracks the current balance, lifetime counters, the user's
/// referral code and the Stripe customer link. The balance is mutated only
/// through store ledger operations, never written directly by feature code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// The user ID (from the identity provider).
    pub user_id: UserId,

    /// Current credit balance. Never negative.
    pub balance_credits: i64,

    /// Lifetime credits purchased.
    pub lifetime_purchased_credits: i64,

    /// Lifetime credits granted (signup, promo, referral bonuses).
    pub lifetime_granted_credits: i64,

    /// Lifetime credits spent on usage.
    pub lifetime_used_credits: i64,

    /// The user's referral code, once one has been issued.
    pub referral_code: Option<String>,

    /// Stripe customer ID for payments.
    pub stripe_customer_id: Option<String>,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance_credits: 0,
            lifetime_purchased_credits: 0,
            lifetime_granted_credits: 0,
            lifetime_used_credits: 0,
            referral_code: None,
            stripe_customer_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account has sufficient credits for a deduction.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount_credits: i64) -> bool {
        self.balance_credits >= amount_credits
    }
}
