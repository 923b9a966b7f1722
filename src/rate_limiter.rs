//! Process-wide query throttle
//!
//! Every outgoing query passes through [`RateLimiter::acquire`], which spaces
//! calls at least `min_interval` apart. The last-call timestamp sits behind an
//! async mutex that stays locked while a caller waits, so concurrent callers
//! queue up one interval apart instead of bursting.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::trace;

/// Default spacing between queries: at most 4 per second, under a 5 qps cap
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(250);

/// Minimum-interval rate limiter for API requests
#[derive(Debug)]
pub struct RateLimiter {
    /// Minimum time between two consecutive `acquire` returns
    min_interval: Duration,
    /// When the previous `acquire` returned
    last_call: Mutex<Option<Instant>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn from_millis(min_interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(min_interval_ms))
    }

    #[must_use]
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until `min_interval` has passed since the previous call returned.
    pub async fn acquire(&self) {
        let mut last_call = self.last_call.lock().await;

        if let Some(last) = *last_call {
            let ready_at = last + self.min_interval;
            if ready_at > Instant::now() {
                trace!(
                    "Rate limit: waiting {:.3}s",
                    (ready_at - Instant::now()).as_secs_f64()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }

        *last_call = Some(Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_INTERVAL)
    }
}
