//! Subset of the Stripe API surface this service touches.
//!
//! Only the fields we read are modeled; everything else in Stripe's payloads
//! is ignored by serde.

use serde::Deserialize;

/// A Stripe customer, created at signup so purchases share one identity.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe's customer id (`cus_...`).
    pub id: String,
    /// Email, when one was attached.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name, when one was attached.
    #[serde(default)]
    pub name: Option<String>,
}

/// The purchase attribution we stamp onto every checkout session.
///
/// Stripe echoes these back in the completion webhook, which is how the
/// credit grant finds its user and amount. Metadata values are always
/// strings on the wire, so `credits` is parsed at the point of use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionMetadata {
    /// The purchasing user.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Credits the package grants, as a decimal string.
    #[serde(default)]
    pub credits: Option<String>,
    /// The catalog package id.
    #[serde(default)]
    pub package_id: Option<String>,
}

/// A Stripe Checkout session, both as returned from session creation and as
/// embedded in the `checkout.session.completed` webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`); the webhook replay guard keys off this.
    pub id: String,
    /// Hosted payment page URL, present on freshly created sessions.
    #[serde(default)]
    pub url: Option<String>,
    /// `"paid"` once the payment settled.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Payment intent id (`pi_...`), kept for audit cross-reference.
    #[serde(default)]
    pub payment_intent: Option<String>,
    /// Fallback user attribution when metadata was stripped.
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Our purchase attribution (see [`SessionMetadata`]).
    #[serde(default)]
    pub metadata: SessionMetadata,
}

impl CheckoutSession {
    /// The purchasing user's id: metadata first, client reference as backup.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.metadata
            .user_id
            .as_deref()
            .or(self.client_reference_id.as_deref())
    }

    /// Credits this session purchased, or zero when absent or malformed.
    #[must_use]
    pub fn credits(&self) -> i64 {
        self.metadata
            .credits
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }
}

/// Stripe's error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// One Stripe API error.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Coarse category (`invalid_request_error`, `api_error`, ...).
    #[serde(rename = "type")]
    pub error_type: String,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code, when Stripe provides one.
    #[serde(default)]
    pub code: Option<String>,
}
