//! `RocksDB` storage layer for omni-credits.
//!
//! This crate provides persistent storage for accounts, the transaction
//! ledger, usage logs, promo codes, referrals and processed payment sessions
//! using `RocksDB` with column families for efficient indexing.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `user_id`
//! - `transactions`: Credit transactions, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: Index for listing transactions by user
//! - `usage_logs`: Usage audit records, keyed by caller event id
//! - `promo_codes` / `promo_redemptions`: Codes and the single-use join rows
//! - `referrals` / `referral_codes`: Referral pairs and code ownership
//! - `payment_sessions`: Processed checkout sessions (webhook replay guard)
//!
//! Every multi-record mutation described by the trait's compound operations
//! commits through a single `WriteBatch`: all effects land or none do.
//!
//! # Example
//!
//! ```no_run
//! use omni_credits_store::{RocksStore, Store};
//! use omni_credits_core::{Account, UserId};
//!
//! let store = RocksStore::open("/tmp/omni-credits-db").unwrap();
//!
//! let user_id = UserId::generate();
//! let account = Account::new(user_id);
//! store.put_account(&account).unwrap();
//!
//! let retrieved = store.get_account(&user_id).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use omni_credits_core::{
    Account, CreditTransaction, PaymentSession, PromoCode, PromoRedemption, Referral,
    TransactionId, UsageLog, UserId,
};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations. Compound operations re-run their business-rule checks
/// against fresh rows inside the atomic boundary, so callers never rely on
/// an earlier read staying valid.
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Create an account together with its welcome bonus, atomically.
    ///
    /// The account's balance must already reflect the bonus transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn create_account(&self, account: &Account, welcome_tx: &CreditTransaction) -> Result<()>;

    /// Insert or update an account record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_account(&self, account: &Account) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<Account>>;

    /// Delete an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn delete_account(&self, user_id: &UserId) -> Result<()>;

    // =========================================================================
    // Transaction Operations
    // =========================================================================

    /// Get a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>>;

    /// List transactions for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;

    // =========================================================================
    // Usage Operations
    // =========================================================================

    /// Get a usage log by event ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_usage_log(&self, event_id: &str) -> Result<Option<UsageLog>>;

    /// Debit a metered operation: deduct credits, record the usage
    /// transaction and the usage log, all atomically.
    ///
    /// The balance is re-validated here; an earlier authorization check is
    /// not trusted. Returns the new balance after deduction.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientCredits` if balance is too low.
    /// - `StoreError::DuplicateEvent` if the event was already processed.
    ///
    /// On any error no column family is modified.
    fn debit_usage(&self, log: &UsageLog, transaction: &CreditTransaction) -> Result<i64>;

    // =========================================================================
    // Top-Up Operations
    // =========================================================================

    /// Add credits to an account and record the transaction atomically.
    ///
    /// Returns the new balance after addition.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn add_credits(
        &self,
        user_id: &UserId,
        amount_credits: i64,
        transaction: &CreditTransaction,
    ) -> Result<i64>;

    /// Credit a purchase from a payment webhook, atomically recording the
    /// payment session for replay protection.
    ///
    /// Returns the new balance after addition.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::DuplicateSession` if the session was already processed.
    fn credit_purchase(
        &self,
        user_id: &UserId,
        amount_credits: i64,
        session: &PaymentSession,
        transaction: &CreditTransaction,
    ) -> Result<i64>;

    /// Check if a payment session has already been processed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn has_payment_session(&self, session_id: &str) -> Result<bool>;

    // =========================================================================
    // Promo Operations
    // =========================================================================

    /// Insert or update a promo code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_promo_code(&self, code: &PromoCode) -> Result<()>;

    /// Get a promo code (case-insensitive lookup).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_promo_code(&self, code: &str) -> Result<Option<PromoCode>>;

    /// Get this user's redemption of a code, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_redemption(&self, user_id: &UserId, code: &str) -> Result<Option<PromoRedemption>>;

    /// Redeem a credits promo code, atomically: grant the credits, record
    /// the bonus transaction and the redemption row, bump the code's use
    /// count. Validation is re-run against the stored code inside this
    /// operation.
    ///
    /// Returns the new balance after the grant.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::PromoRejected` if re-validation fails.
    ///
    /// On any error no column family is modified.
    fn redeem_promo(
        &self,
        user_id: &UserId,
        code: &str,
        transaction: &CreditTransaction,
        redemption: &PromoRedemption,
    ) -> Result<i64>;

    // =========================================================================
    // Referral Operations
    // =========================================================================

    /// Resolve a referral code to its owner.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_user_by_referral_code(&self, code: &str) -> Result<Option<UserId>>;

    /// Assign a referral code to a user, atomically claiming the code and
    /// updating the account record.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::ReferralCodeTaken` if the code is already owned.
    fn assign_referral_code(&self, user_id: &UserId, code: &str) -> Result<()>;

    /// Get the referral row for a (referrer, referred) pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_referral(
        &self,
        referrer_id: &UserId,
        referred_id: &UserId,
    ) -> Result<Option<Referral>>;

    /// Apply a referral bonus, atomically: record the completed referral and
    /// credit both parties with their bonus transactions.
    ///
    /// Returns (referrer balance, referred balance) after the grants.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if either account doesn't exist.
    /// - `StoreError::AlreadyReferred` if the pair already has a row.
    ///
    /// On any error no column family is modified.
    fn apply_referral(
        &self,
        referral: &Referral,
        referrer_tx: &CreditTransaction,
        referred_tx: &CreditTransaction,
    ) -> Result<(i64, i64)>;

    /// List a referrer's outgoing referrals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_referrals_by_referrer(&self, referrer_id: &UserId) -> Result<Vec<Referral>>;
}
