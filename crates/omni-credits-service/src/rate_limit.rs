//! Rate limiting for the estimate endpoint.
//!
//! The limiter is an injected abstraction so deployments can back it with a
//! shared store. The bundled in-memory implementation keeps a per-process
//! map with a periodic sweep and is therefore only correct for
//! single-instance deployments; running more than one process multiplies the
//! effective limit by the process count.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// A fixed-window rate limiter.
pub trait RateLimiter: Send + Sync {
    /// Record a hit for `key` and return whether it is within the limit.
    fn check(&self, key: &str) -> bool;
}

/// A limiter that always allows; used when rate limiting is disabled.
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check(&self, _key: &str) -> bool {
        true
    }
}

struct Window {
    started: Instant,
    count: u32,
}

/// Per-process fixed-window limiter.
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<String, Window>>,
}

impl InMemoryRateLimiter {
    /// Create a limiter allowing `max_requests` per `window` per key.
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Drop windows that have fully elapsed.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned, which only happens after a
    /// panic while holding it.
    pub fn sweep(&self) {
        let window = self.window;
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");
        hits.retain(|_, w| now.duration_since(w.started) < window);
    }

    /// Number of tracked keys, for the sweeper's log line.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn tracked_keys(&self) -> usize {
        self.hits.lock().expect("rate limiter lock poisoned").len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut hits = self.hits.lock().expect("rate limiter lock poisoned");

        let window = hits.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.duration_since(window.started) >= self.window {
            window.started = now;
            window.count = 0;
        }

        window.count += 1;
        window.count <= self.max_requests
    }
}

/// Spawn the periodic sweep for an in-memory limiter.
pub fn spawn_sweeper(limiter: std::sync::Arc<InMemoryRateLimiter>, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            limiter.sweep();
            tracing::debug!(tracked_keys = limiter.tracked_keys(), "Rate limiter swept");
        }
    });
}
