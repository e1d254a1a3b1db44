//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in
//! column families. Composite keys use fixed-width id segments so prefix
//! scans stay unambiguous.

use omni_credits_core::{normalize_code, TransactionId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a transaction key from a transaction ID.
#[must_use]
pub fn transaction_key(transaction_id: &TransactionId) -> Vec<u8> {
    transaction_id.to_bytes().to_vec()
}

/// Create a user-transaction index key.
///
/// Format: `user_id (16 bytes) || transaction_id (16 bytes)`
///
/// Since ULIDs are time-ordered, transactions for a user will be sorted by time.
#[must_use]
pub fn user_transaction_key(user_id: &UserId, transaction_id: &TransactionId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&transaction_id.to_bytes());
    key
}

/// Create a prefix for iterating all transactions for a user.
#[must_use]
pub fn user_transactions_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the transaction ID from a user-transaction index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_transaction_id_from_user_key(key: &[u8]) -> TransactionId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    TransactionId::from_bytes(bytes).expect("valid ULID bytes")
}

/// Create a usage log key from an event ID.
#[must_use]
pub fn usage_log_key(event_id: &str) -> Vec<u8> {
    event_id.as_bytes().to_vec()
}

/// Create a promo code key from a (not necessarily normalized) code.
#[must_use]
pub fn promo_code_key(code: &str) -> Vec<u8> {
    normalize_code(code).into_bytes()
}

/// Create a promo redemption key.
///
/// Format: `user_id (16 bytes) || normalized code`. Exact-key presence
/// enforces at most one redemption per (code, user) pair.
#[must_use]
pub fn redemption_key(user_id: &UserId, code: &str) -> Vec<u8> {
    let normalized = normalize_code(code);
    let mut key = Vec::with_capacity(16 + normalized.len());
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(normalized.as_bytes());
    key
}

/// Create a referral key.
///
/// Format: `referrer_id (16 bytes) || referred_id (16 bytes)`. Exact-key
/// presence enforces at most one bonus per pair; the referrer prefix allows
/// listing a user's outgoing referrals.
#[must_use]
pub fn referral_key(referrer_id: &UserId, referred_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(referrer_id.as_bytes());
    key.extend_from_slice(referred_id.as_bytes());
    key
}

/// Create a prefix for iterating all referrals by one referrer.
#[must_use]
pub fn referrer_prefix(referrer_id: &UserId) -> Vec<u8> {
    referrer_id.as_bytes().to_vec()
}

/// Create a referral code ownership key.
#[must_use]
pub fn referral_code_key(code: &str) -> Vec<u8> {
    normalize_code(code).into_bytes()
}

/// Create a payment session key from a provider session ID.
#[must_use]
pub fn payment_session_key(session_id: &str) -> Vec<u8> {
    session_id.as_bytes().to_vec()
}
