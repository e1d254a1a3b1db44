//! Error types for omni-credits storage.

use omni_credits_core::PromoRejection;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Insufficient credits for a deduction.
    #[error("insufficient credits: balance={balance}, required={required}")]
    InsufficientCredits {
        /// Current balance in credits.
        balance: i64,
        /// Required amount in credits.
        required: i64,
    },

    /// Duplicate usage event (idempotency check failed).
    #[error("duplicate event: {event_id}")]
    DuplicateEvent {
        /// The event ID that was duplicated.
        event_id: String,
    },

    /// Payment session already processed (webhook replay).
    #[error("duplicate payment session: {session_id}")]
    DuplicateSession {
        /// The session ID that was duplicated.
        session_id: String,
    },

    /// Promo redemption rejected by the re-validation inside the atomic op.
    #[error("promo rejected: {0}")]
    PromoRejected(#[from] PromoRejection),

    /// A referral row already exists for this (referrer, referred) pair.
    #[error("referral already recorded for this pair")]
    AlreadyReferred,

    /// The referral code is already mapped to another user.
    #[error("referral code taken: {code}")]
    ReferralCodeTaken {
        /// The colliding code.
        code: String,
    },
}
