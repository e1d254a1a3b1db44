//! Column family definitions.

/// Column family names.
pub mod cf {
    /// Account records, keyed by user id.
    pub const ACCOUNTS: &str = "accounts";
    /// Credit transactions, keyed by transaction id (ULID).
    pub const TRANSACTIONS: &str = "transactions";
    /// Index for listing transactions by user.
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";
    /// Usage logs, keyed by caller event id (doubles as idempotency guard).
    pub const USAGE_LOGS: &str = "usage_logs";
    /// Promo codes, keyed by normalized code.
    pub const PROMO_CODES: &str = "promo_codes";
    /// Promo redemptions, keyed by user id + normalized code.
    pub const PROMO_REDEMPTIONS: &str = "promo_redemptions";
    /// Referral rows, keyed by referrer id + referred id.
    pub const REFERRALS: &str = "referrals";
    /// Referral code ownership, keyed by code.
    pub const REFERRAL_CODES: &str = "referral_codes";
    /// Processed payment sessions, keyed by provider session id.
    pub const PAYMENT_SESSIONS: &str = "payment_sessions";
}

/// All column families, for database open.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::USAGE_LOGS,
        cf::PROMO_CODES,
        cf::PROMO_REDEMPTIONS,
        cf::REFERRALS,
        cf::REFERRAL_CODES,
        cf::PAYMENT_SESSIONS,
    ]
}
