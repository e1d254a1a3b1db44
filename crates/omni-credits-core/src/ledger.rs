//! Credit transaction types for omni-credits.
//!
//! This module defines the append-only ledger entries that track all balance changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{TransactionId, UserId};

/// A credit transaction representing a balance change.
///
/// All changes to an account's balance create a transaction record.
/// Transactions use ULIDs for time-ordered IDs. The sum of a user's
/// transaction amounts always equals the current balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Amount in credits. Positive = credit, Negative = debit.
    pub amount_credits: i64,

    /// Type of transaction.
    pub kind: TransactionKind,

    /// Balance after this transaction (in credits).
    pub balance_after_credits: i64,

    /// Human-readable description.
    pub description: String,

    /// Additional metadata (payment session, promo code, tool, etc.).
    pub metadata: serde_json::Value,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// Create a new purchase transaction.
    #[must_use]
    pub fn purchase(
        user_id: UserId,
        amount_credits: i64,
        balance_after_credits: i64,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_credits,
            kind: TransactionKind::Purchase,
            balance_after_credits,
            description,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create a new bonus transaction (signup, promo, referral).
    #[must_use]
    pub fn bonus(
        user_id: UserId,
        amount_credits: i64,
        balance_after_credits: i64,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_credits,
            kind: TransactionKind::Bonus,
            balance_after_credits,
            description,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create a new usage transaction (deduction).
    #[must_use]
    pub fn usage(
        user_id: UserId,
        amount_credits: i64,
        balance_after_credits: i64,
        description: String,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_credits: -amount_credits.abs(), // Always negative for usage
            kind: TransactionKind::Usage,
            balance_after_credits,
            description,
            metadata,
            created_at: Utc::now(),
        }
    }

    /// Create a new refund transaction.
    #[must_use]
    pub fn refund(
        user_id: UserId,
        amount_credits: i64,
        balance_after_credits: i64,
        reason: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount_credits,
            kind: TransactionKind::Refund,
            balance_after_credits,
            description: reason,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}

/// Type of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// User purchased credits.
    Purchase,

    /// Granted credits: welcome bonus, promo redemption, referral reward.
    Bonus,

    /// Credits deducted for a metered operation.
    Usage,

    /// Refund issued.
    Refund,
}

impl TransactionKind {
    /// Check if this transaction kind adds credits (positive balance change).
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::Purchase | Self::Bonus | Self::Refund)
    }

    /// Check if this transaction kind removes credits (negative balance change).
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Usage)
    }

    /// Stable snake_case name, used in API responses and metadata.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Bonus => "bonus",
            Self::Usage => "usage",
            Self::Refund => "refund",
        }
    }
}
