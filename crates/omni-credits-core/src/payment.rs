//! Payment session records.
//!
//! One row per processed checkout session. The session id is the replay
//! guard for payment webhooks: a redelivered event finds the row and is
//! acknowledged without crediting again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A processed payment-provider checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSession {
    /// The provider's checkout session id.
    pub session_id: String,

    /// The purchasing user.
    pub user_id: UserId,

    /// Credits granted by this purchase.
    pub credits: i64,

    /// The catalog package that was bought, if attributed.
    pub package_id: Option<String>,

    /// The provider's payment intent id, for audit cross-reference.
    pub payment_intent: Option<String>,

    /// When the webhook was processed.
    pub processed_at: DateTime<Utc>,
}

impl PaymentSession {
    /// Create a session record timestamped now.
    #[must_use]
    pub fn new(session_id: String, user_id: UserId, credits: i64) -> Self {
        Self {
            session_id,
            user_id,
            credits,
            package_id: None,
            payment_intent: None,
            processed_at: Utc::now(),
        }
    }

    /// Attribute the purchase to a catalog package.
    #[must_use]
    pub fn with_package(mut self, package_id: impl Into<String>) -> Self {
        self.package_id = Some(package_id.into());
        self
    }

    /// Record the provider's payment intent id.
    #[must_use]
    pub fn with_payment_intent(mut self, payment_intent: impl Into<String>) -> Self {
        self.payment_intent = Some(payment_intent.into());
        self
    }
}
