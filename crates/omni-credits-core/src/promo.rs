//! Promo code types for omni-credits.
//!
//! Codes are matched case-insensitively and stored normalized. Validation is
//! an ordered state machine: the first failing check wins, and redemption
//! re-runs the same checks inside the store's atomic boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// What a promo code grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoKind {
    /// Grants credits directly on redemption.
    Credits,
    /// Percentage discount applied at checkout.
    DiscountPercent,
    /// Fixed discount (minor currency units) applied at checkout.
    DiscountFixed,
}

impl PromoKind {
    /// Stable snake_case name, used in API payloads.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credits => "credits",
            Self::DiscountPercent => "discount_percent",
            Self::DiscountFixed => "discount_fixed",
        }
    }
}

/// A redeemable promo code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoCode {
    /// The code, normalized to uppercase.
    pub code: String,

    /// What the code grants.
    pub kind: PromoKind,

    /// Credits for `Credits` codes, percent or minor currency units for
    /// discount codes.
    pub value: i64,

    /// Whether the code can currently be redeemed.
    pub active: bool,

    /// Optional expiry timestamp.
    pub expires_at: Option<DateTime<Utc>>,

    /// Optional cap on total redemptions.
    pub max_uses: Option<u32>,

    /// How many times the code has been redeemed.
    pub used_count: u32,

    /// When the code was created.
    pub created_at: DateTime<Utc>,
}

impl PromoCode {
    /// Create a new active code. The code string is normalized.
    #[must_use]
    pub fn new(code: &str, kind: PromoKind, value: i64) -> Self {
        Self {
            code: normalize_code(code),
            kind,
            value,
            active: true,
            expires_at: None,
            max_uses: None,
            used_count: 0,
            created_at: Utc::now(),
        }
    }

    /// Set an expiry timestamp.
    #[must_use]
    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Cap the total number of redemptions.
    #[must_use]
    pub fn with_max_uses(mut self, max_uses: u32) -> Self {
        self.max_uses = Some(max_uses);
        self
    }

    /// Run the ordered validation checks for a prospective redemption.
    ///
    /// `already_used` is whether this user already holds a redemption for
    /// this code. The existence check (`InvalidCode`) happens at lookup time,
    /// before a `PromoCode` value exists.
    ///
    /// # Errors
    ///
    /// Returns the first failing check as a [`PromoRejection`].
    pub fn validate(
        &self,
        now: DateTime<Utc>,
        already_used: bool,
    ) -> Result<(), PromoRejection> {
        if !self.active {
            return Err(PromoRejection::CodeInactive);
        }
        if self.expires_at.is_some_and(|expiry| now > expiry) {
            return Err(PromoRejection::CodeExpired);
        }
        if self.max_uses.is_some_and(|cap| self.used_count >= cap) {
            return Err(PromoRejection::CodeExhausted);
        }
        if already_used {
            return Err(PromoRejection::AlreadyUsed);
        }
        Ok(())
    }
}

/// Normalize a code for storage and lookup (codes match case-insensitively).
#[must_use]
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// One user's redemption of one code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromoRedemption {
    /// The normalized code that was redeemed.
    pub code: String,

    /// The redeeming user.
    pub user_id: UserId,

    /// Credits granted by the redemption.
    pub credits_awarded: i64,

    /// When the redemption happened.
    pub redeemed_at: DateTime<Utc>,
}

/// Why a promo validation or redemption was rejected.
///
/// These are expected business outcomes, returned as values for the caller
/// to branch on. The presentation layer maps [`error_code`](Self::error_code)
/// to a localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromoRejection {
    /// No code with this name exists.
    #[error("promo code does not exist")]
    InvalidCode,

    /// The code has been deactivated.
    #[error("promo code is inactive")]
    CodeInactive,

    /// The code's expiry timestamp has passed.
    #[error("promo code has expired")]
    CodeExpired,

    /// The code's redemption cap has been reached.
    #[error("promo code has no redemptions left")]
    CodeExhausted,

    /// This user already redeemed this code.
    #[error("promo code was already redeemed by this user")]
    AlreadyUsed,

    /// Standalone redemption only applies to credits codes.
    #[error("promo code is not a credits code")]
    NotCreditsCode,
}

impl PromoRejection {
    /// Stable error code for per-locale message lookup.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCode => "invalid_code",
            Self::CodeInactive => "code_inactive",
            Self::CodeExpired => "code_expired",
            Self::CodeExhausted => "code_exhausted",
            Self::AlreadyUsed => "already_used",
            Self::NotCreditsCode => "not_credits_code",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn codes_are_normalized() {
        let code = PromoCode::new("  welcome10 ", PromoKind::Credits, 10);
        assert_eq!(code.code, "WELCOME10");
        assert_eq!(normalize_code("Welcome10"), "WELCOME10");
    }

    #[test]
    fn valid_code_passes() {
        let code = PromoCode::new("SPRING", PromoKind::Credits, 50);
        assert!(code.validate(Utc::now(), false).is_ok());
    }

    #[test]
    fn inactive_wins_over_expiry() {
        // Validation order: inactive is checked before expiry.
        let mut code = PromoCode::new("OLD", PromoKind::Credits, 50)
            .with_expiry(Utc::now() - Duration::days(1));
        code.active = false;

        assert_eq!(
            code.validate(Utc::now(), false),
            Err(PromoRejection::CodeInactive)
        );
    }

    #[test]
    fn expired_code_rejected() {
        let code = PromoCode::new("OLD", PromoKind::Credits, 50)
            .with_expiry(Utc::now() - Duration::hours(1));

        assert_eq!(
            code.validate(Utc::now(), false),
            Err(PromoRejection::CodeExpired)
        );
    }

    #[test]
    fn exhausted_wins_over_already_used() {
        let mut code = PromoCode::new("CAPPED", PromoKind::Credits, 50).with_max_uses(1);
        code.used_count = 1;

        assert_eq!(
            code.validate(Utc::now(), true),
            Err(PromoRejection::CodeExhausted)
        );
    }

    #[test]
    fn already_used_rejected() {
        let code = PromoCode::new("ONCE", PromoKind::Credits, 50);
        assert_eq!(
            code.validate(Utc::now(), true),
            Err(PromoRejection::AlreadyUsed)
        );
    }

    #[test]
    fn under_cap_passes() {
        let mut code = PromoCode::new("CAPPED", PromoKind::Credits, 50).with_max_uses(100);
        code.used_count = 99;
        assert!(code.validate(Utc::now(), false).is_ok());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(PromoRejection::InvalidCode.error_code(), "invalid_code");
        assert_eq!(PromoRejection::AlreadyUsed.error_code(), "already_used");
        assert_eq!(
            PromoRejection::NotCreditsCode.error_code(),
            "not_credits_code"
        );
    }
}
