//! Localized messages for business-rule rejections.
//!
//! The ledger core only emits stable error codes; this table maps them to
//! user-facing text per locale. Adding a language means adding one table
//! entry per error code.

use serde::Deserialize;

/// Supported response locales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// German.
    De,
}

impl Locale {
    /// Parse a language tag, falling back to English.
    #[must_use]
    pub fn parse(tag: Option<&str>) -> Self {
        match tag.map(str::trim).map(str::to_lowercase).as_deref() {
            Some("de") => Self::De,
            _ => Self::En,
        }
    }
}

/// Look up the localized message for a stable error code.
///
/// Unknown codes fall back to a generic message so a missing table entry
/// never breaks a response.
#[must_use]
pub fn message(code: &str, locale: Locale) -> &'static str {
    match (code, locale) {
        ("invalid_code", Locale::En) => "This promo code does not exist.",
        ("invalid_code", Locale::De) => "Dieser Gutscheincode existiert nicht.",
        ("code_inactive", Locale::En) => "This promo code is no longer active.",
        ("code_inactive", Locale::De) => "Dieser Gutscheincode ist nicht mehr aktiv.",
        ("code_expired", Locale::En) => "This promo code has expired.",
        ("code_expired", Locale::De) => "Dieser Gutscheincode ist abgelaufen.",
        ("code_exhausted", Locale::En) => "This promo code has been fully redeemed.",
        ("code_exhausted", Locale::De) => "Dieser Gutscheincode wurde bereits vollständig eingelöst.",
        ("already_used", Locale::En) => "You have already redeemed this promo code.",
        ("already_used", Locale::De) => "Sie haben diesen Gutscheincode bereits eingelöst.",
        ("not_credits_code", Locale::En) => "This promo code cannot be redeemed for credits.",
        ("not_credits_code", Locale::De) => {
            "Dieser Gutscheincode kann nicht gegen Guthaben eingelöst werden."
        }
        ("insufficient_credits", Locale::En) => "Your credit balance is too low.",
        ("insufficient_credits", Locale::De) => "Ihr Guthaben reicht nicht aus.",
        ("self_referral", Locale::En) => "You cannot refer yourself.",
        ("self_referral", Locale::De) => "Sie können sich nicht selbst werben.",
        ("already_referred", Locale::En) => "This referral has already been rewarded.",
        ("already_referred", Locale::De) => "Diese Empfehlung wurde bereits belohnt.",
        (_, Locale::En) => "The request could not be completed.",
        (_, Locale::De) => "Die Anfrage konnte nicht abgeschlossen werden.",
    }
}
