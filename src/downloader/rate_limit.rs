//! Request spacing with adaptive widening under sustained errors
//!
//! Every outbound call to the upstream API goes through [`RateLimiter::acquire`].
//! The limiter hands out time slots at least one interval apart; while the
//! consecutive-error score is above [`ERROR_THROTTLE_THRESHOLD`] the interval
//! is doubled.
//!
//! Slots are reserved under a lock and awaited outside it, so concurrent
//! callers queue up behind each other instead of racing for the same slot.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::downloader::config::{
    base_interval, ERROR_SCORE_DECAY, ERROR_THROTTLE_THRESHOLD, MAX_RPS,
};

/// Shared mutable limiter state
#[derive(Debug, Clone, Default)]
pub struct RequestBudget {
    /// Slot handed to the most recent caller
    pub last_request: Option<Instant>,
    /// Failure score: +1 per failed attempt, -0.5 per success, never negative
    pub consecutive_errors: f64,
    /// Slots handed out so far
    pub granted: u64,
}

/// Minimum-spacing rate limiter
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    budget: Mutex<RequestBudget>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(MAX_RPS)
    }
}

impl RateLimiter {
    /// Limiter allowing `max_rps` requests per second
    pub fn per_second(max_rps: u32) -> Self {
        Self::with_interval(base_interval(max_rps))
    }

    /// Limiter with an explicit base interval
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            budget: Mutex::new(RequestBudget::default()),
        }
    }

    /// Base spacing between two requests
    pub fn base_interval(&self) -> Duration {
        self.interval
    }

    /// Spacing currently enforced, doubled while the error score is high
    pub fn effective_interval(&self) -> Duration {
        Self::interval_for(self.interval, self.lock().consecutive_errors)
    }

    /// Wait until the next request slot
    ///
    /// Suspends only the calling task. The slot is `max(now, previous + interval)`.
    pub async fn acquire(&self) {
        let slot = {
            let mut budget = self.lock();
            let interval = Self::interval_for(self.interval, budget.consecutive_errors);
            let now = Instant::now();
            let slot = match budget.last_request {
                Some(last) => (last + interval).max(now),
                None => now,
            };
            budget.last_request = Some(slot);
            budget.granted += 1;
            slot
        };

        let wait = slot.saturating_duration_since(Instant::now());
        if !wait.is_zero() {
            debug!(wait_ms = wait.as_millis() as u64, "rate limiter delaying request");
        }
        sleep_until(slot).await;
    }

    /// Record a successful (or definitively absent) response
    pub fn record_success(&self) {
        let mut budget = self.lock();
        budget.consecutive_errors = (budget.consecutive_errors - ERROR_SCORE_DECAY).max(0.0);
    }

    /// Record a failed attempt
    pub fn record_error(&self) {
        let mut budget = self.lock();
        budget.consecutive_errors += 1.0;
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> RequestBudget {
        self.lock().clone()
    }

    fn interval_for(base: Duration, consecutive_errors: f64) -> Duration {
        if consecutive_errors > ERROR_THROTTLE_THRESHOLD {
            base * 2
        } else {
            base
        }
    }

    fn lock(&self) -> MutexGuard<'_, RequestBudget> {
        self.budget.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
