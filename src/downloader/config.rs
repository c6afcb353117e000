//! Extraction tuning constants

use std::time::Duration;

/// Maximum requests per second allowed against the upstream API.
/// The API answers bursts above this with 403.
pub const MAX_RPS: u32 = 7;

/// Attempts per logical request (first try included).
pub const MAX_ATTEMPTS: u32 = 3;

/// Base backoff delay in milliseconds; attempt `n` waits `2^n` times this.
pub const INITIAL_BACKOFF_MS: u64 = 1000;

/// Maximum backoff delay in milliseconds.
pub const MAX_BACKOFF_MS: u64 = 60_000;

/// Consecutive-error score above which the limiter interval doubles.
pub const ERROR_THROTTLE_THRESHOLD: f64 = 3.0;

/// Amount the consecutive-error score recovers per successful request.
pub const ERROR_SCORE_DECAY: f64 = 0.5;

/// Records enriched concurrently per batch.
pub const BATCH_SIZE: usize = 20;

/// Pause between two date ranges.
pub const RANGE_DELAY_MS: u64 = 2000;

/// Consecutive failed pages after which pagination gives up.
pub const MAX_CONSECUTIVE_PAGE_FAILURES: u32 = 3;

/// Pages requested from the payment-types collection.
pub const PAYMENT_TYPE_PAGES: u32 = 3;

/// Minimum spacing between requests for a given rate
pub fn base_interval(max_rps: u32) -> Duration {
    Duration::from_secs(1) / max_rps.max(1)
}

/// Exponential backoff after failed attempt `attempt` (1-based)
pub fn calculate_backoff(attempt: u32) -> Duration {
    calculate_backoff_from(Duration::from_millis(INITIAL_BACKOFF_MS), attempt)
}

/// Exponential backoff with an explicit base delay
pub fn calculate_backoff_from(base: Duration, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.saturating_mul(factor)
        .min(Duration::from_millis(MAX_BACKOFF_MS))
}
