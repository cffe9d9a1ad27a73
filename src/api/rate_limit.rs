//! Request throttling for the API surface.
//!
//! Limiters are injected through [`crate::api::AppState`] so handlers never touch
//! process-wide state and tests can swap in their own.

use crate::{
    config::RateLimitSettings,
    errors::{Error, Result},
};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
    time::{Duration, Instant},
};
use tracing::warn;

/// Decides whether a caller identified by `key` may make another request.
pub trait RateLimiter: Send + Sync {
    /// Counts one request for `key`.
    ///
    /// # Errors
    /// [`Error::RateLimited`] when the key has used up its budget.
    fn check(&self, key: &str) -> Result<()>;
}

/// Never rejects anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl RateLimiter for Unlimited {
    fn check(&self, _key: &str) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Allows `max_requests` per key in each fixed window of `window_seconds`.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl FixedWindowRateLimiter {
    /// Creates a limiter from the `[rate_limit]` settings.
    #[must_use]
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            max_requests: settings.max_requests,
            window: Duration::from_secs(settings.window_seconds),
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// [`RateLimiter::check`] against an explicit clock reading.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let mut windows = self.windows.lock().unwrap_or_else(PoisonError::into_inner);

        // Drop windows that have run out so the map does not grow without bound
        windows.retain(|_, w| now.duration_since(w.started) < self.window);

        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if entry.count >= self.max_requests {
            let elapsed = now.duration_since(entry.started);
            let retry_after_secs = self.window.saturating_sub(elapsed).as_secs().max(1);
            warn!(key, retry_after_secs, "Rate limit exceeded");
            return Err(Error::RateLimited { retry_after_secs });
        }
        entry.count += 1;
        Ok(())
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }
}
