//! Referral program types for omni-credits.
//!
//! A referral links a referrer to a referred user; the bonus is granted at
//! most once per pair, enforced by the store's composite key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// Prefix of every generated referral code.
pub const REFERRAL_CODE_PREFIX: &str = "REF-";

/// Length of the random suffix in a referral code.
pub const REFERRAL_CODE_SUFFIX_LEN: usize = 8;

/// How many collision retries code generation is allowed.
pub const REFERRAL_CODE_MAX_ATTEMPTS: u32 = 5;

/// A referral relationship between two users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Referral {
    /// The user who invited.
    pub referrer_id: UserId,

    /// The user who signed up.
    pub referred_id: UserId,

    /// Credits granted to each party.
    pub bonus_credits: i64,

    /// Current status.
    pub status: ReferralStatus,

    /// When the referral was recorded.
    pub created_at: DateTime<Utc>,

    /// When the bonus was granted.
    pub completed_at: Option<DateTime<Utc>>,
}

impl Referral {
    /// Create a completed referral with the bonus granted now.
    #[must_use]
    pub fn completed(referrer_id: UserId, referred_id: UserId, bonus_credits: i64) -> Self {
        let now = Utc::now();
        Self {
            referrer_id,
            referred_id,
            bonus_credits,
            status: ReferralStatus::Completed,
            created_at: now,
            completed_at: Some(now),
        }
    }
}

/// Status of a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralStatus {
    /// Recorded but not yet rewarded.
    Pending,
    /// Bonus granted to both parties.
    Completed,
}

/// Aggregated referral statistics for one referrer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferralStats {
    /// The referrer's code, if one has been issued.
    pub referral_code: Option<String>,

    /// Total referral rows.
    pub total_referrals: u64,

    /// Referrals whose bonus was granted.
    pub completed_referrals: u64,

    /// Total credits the referrer earned from referrals.
    pub credits_earned: i64,
}

impl ReferralStats {
    /// Aggregate stats over a referrer's rows.
    #[must_use]
    pub fn aggregate(referral_code: Option<String>, referrals: &[Referral]) -> Self {
        let completed = referrals
            .iter()
            .filter(|r| r.status == ReferralStatus::Completed);

        Self {
            referral_code,
            total_referrals: referrals.len() as u64,
            completed_referrals: completed.clone().count() as u64,
            credits_earned: completed.map(|r| r.bonus_credits).sum(),
        }
    }
}

/// Why a referral operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferralRejection {
    /// A user cannot refer themselves.
    #[error("a user cannot refer themselves")]
    SelfReferral,

    /// This pair already has a referral row.
    #[error("this user was already referred by this referrer")]
    AlreadyReferred,

    /// Code generation ran out of collision retries.
    #[error("could not generate a unique referral code")]
    CodeGenerationExhausted,
}

impl ReferralRejection {
    /// Stable error code for per-locale message lookup.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::SelfReferral => "self_referral",
            Self::AlreadyReferred => "already_referred",
            Self::CodeGenerationExhausted => "code_generation_exhausted",
        }
    }
}

/// Generate a candidate referral code: fixed prefix plus a random suffix.
///
/// Uniqueness is not guaranteed here; the caller persists with
/// retry-on-collision up to [`REFERRAL_CODE_MAX_ATTEMPTS`].
#[must_use]
pub fn generate_referral_code() -> String {
    let suffix: String = uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(REFERRAL_CODE_SUFFIX_LEN)
        .collect::<String>()
        .to_uppercase();

    format!("{REFERRAL_CODE_PREFIX}{suffix}")
}
