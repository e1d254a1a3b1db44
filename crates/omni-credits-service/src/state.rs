//! Application state.

use std::sync::Arc;
use std::time::Duration;

use omni_credits_store::RocksStore;

use crate::config::ServiceConfig;
use crate::rate_limit::{spawn_sweeper, InMemoryRateLimiter, RateLimiter};
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,

    /// Rate limiter for the estimate endpoint.
    pub rate_limiter: Arc<dyn RateLimiter>,
}

impl AppState {
    /// Create a new application state with the bundled in-memory rate
    /// limiter and its periodic sweep.
    ///
    /// Must be called from within a tokio runtime (the sweeper is spawned).
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        let limiter = Arc::new(InMemoryRateLimiter::new(
            config.estimate_rate_limit_per_minute,
            Duration::from_secs(60),
        ));
        spawn_sweeper(limiter.clone(), Duration::from_secs(120));

        Self::with_rate_limiter(store, config, limiter)
    }

    /// Create application state with an injected rate limiter (shared-store
    /// implementations, or a noop limiter in tests).
    #[must_use]
    pub fn with_rate_limiter(
        store: Arc<RocksStore>,
        config: ServiceConfig,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        // Create Stripe client if configured
        let stripe = config.stripe_api_key.as_ref().map(|key| {
            tracing::info!("Stripe integration enabled");
            Arc::new(StripeClient::new(key, config.stripe_webhook_secret.clone()))
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - purchases will not be available");
        }

        Self {
            store,
            config,
            stripe,
            rate_limiter,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
