//! Per-run request statistics
//!
//! Counters are reset at the start of every enrichment run, mutated by every
//! fetch attempt, and read back for the end-of-run summary.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Live counters shared by every task of a run
#[derive(Debug, Default)]
pub struct RunStatistics {
    total: AtomicU64,
    successes: AtomicU64,
    rate_limited: AtomicU64,
    other_errors: AtomicU64,
    retries: AtomicU64,
    successful_retries: AtomicU64,
    failed_after_retries: AtomicU64,
    data_loss: AtomicU64,
    not_found: AtomicU64,
}

/// Point-in-time copy of [`RunStatistics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Attempts made (each retry counts)
    pub total: u64,
    /// Attempts that returned a usable (or definitively absent) answer
    pub successes: u64,
    /// Attempts answered with 403
    pub rate_limited: u64,
    /// Attempts that failed for any other reason
    pub other_errors: u64,
    /// Retries scheduled after a failed attempt
    pub retries: u64,
    /// Logical requests that succeeded after at least one retry
    pub successful_retries: u64,
    /// Logical requests that exhausted every attempt
    pub failed_after_retries: u64,
    /// Critical payloads or whole records lost
    pub data_loss: u64,
    /// Lookups answered with 404
    pub not_found: u64,
}

impl RunStatistics {
    /// Fresh zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in self.counters() {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Count one attempt
    pub fn record_attempt(&self) {
        self.total.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a successful attempt
    pub fn record_success(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a 404 answer; it also counts as a completed request
    pub fn record_not_found(&self) {
        self.successes.fetch_add(1, Ordering::Relaxed);
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a 403 attempt
    pub fn record_rate_limited(&self) {
        self.rate_limited.fetch_add(1, Ordering::Relaxed);
    }

    /// Count any other failed attempt
    pub fn record_other_error(&self) {
        self.other_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a scheduled retry
    pub fn record_retry(&self) {
        self.retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a logical request that needed retries and then succeeded
    pub fn record_successful_retry(&self) {
        self.successful_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a logical request that exhausted its attempts
    pub fn record_failed_after_retries(&self) {
        self.failed_after_retries.fetch_add(1, Ordering::Relaxed);
    }

    /// Count lost data
    pub fn record_data_loss(&self) {
        self.data_loss.fetch_add(1, Ordering::Relaxed);
    }

    /// Copy the current values
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total.load(Ordering::Relaxed),
            successes: self.successes.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            other_errors: self.other_errors.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            successful_retries: self.successful_retries.load(Ordering::Relaxed),
            failed_after_retries: self.failed_after_retries.load(Ordering::Relaxed),
            data_loss: self.data_loss.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
        }
    }

    fn counters(&self) -> [&AtomicU64; 9] {
        [
            &self.total,
            &self.successes,
            &self.rate_limited,
            &self.other_errors,
            &self.retries,
            &self.successful_retries,
            &self.failed_after_retries,
            &self.data_loss,
            &self.not_found,
        ]
    }
}

impl StatsSnapshot {
    /// Share of `total`, in percent; 0 when nothing was attempted
    pub fn percent_of_total(&self, count: u64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            count as f64 / self.total as f64 * 100.0
        }
    }

    /// Every counter as a share of `total`
    pub fn percentages(&self) -> SummaryPercentages {
        SummaryPercentages {
            successes: self.percent_of_total(self.successes),
            rate_limited: self.percent_of_total(self.rate_limited),
            other_errors: self.percent_of_total(self.other_errors),
            retries: self.percent_of_total(self.retries),
            successful_retries: self.percent_of_total(self.successful_retries),
            failed_after_retries: self.percent_of_total(self.failed_after_retries),
            data_loss: self.percent_of_total(self.data_loss),
            not_found: self.percent_of_total(self.not_found),
        }
    }

    /// Emit the end-of-run summary
    pub fn log_summary(&self, pipeline: &str) {
        let pct = self.percentages();
        info!(
            pipeline,
            total = self.total,
            successes = self.successes,
            success_pct = %format!("{:.1}", pct.successes),
            rate_limited = self.rate_limited,
            rate_limited_pct = %format!("{:.1}", pct.rate_limited),
            other_errors = self.other_errors,
            other_errors_pct = %format!("{:.1}", pct.other_errors),
            retries = self.retries,
            retries_pct = %format!("{:.1}", pct.retries),
            successful_retries = self.successful_retries,
            successful_retries_pct = %format!("{:.1}", pct.successful_retries),
            failed_after_retries = self.failed_after_retries,
            failed_after_retries_pct = %format!("{:.1}", pct.failed_after_retries),
            data_loss = self.data_loss,
            data_loss_pct = %format!("{:.1}", pct.data_loss),
            not_found = self.not_found,
            not_found_pct = %format!("{:.1}", pct.not_found),
            "Request statistics summary"
        );
    }
}

/// Counters of a [`StatsSnapshot`] in percent of its `total`
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SummaryPercentages {
    /// Completed requests
    pub successes: f64,
    /// 403 answers
    pub rate_limited: f64,
    /// Other failures
    pub other_errors: f64,
    /// Retries scheduled
    pub retries: f64,
    /// Requests that succeeded after a retry
    pub successful_retries: f64,
    /// Requests that exhausted their attempts
    pub failed_after_retries: f64,
    /// Lost records or payloads
    pub data_loss: f64,
    /// 404 answers
    pub not_found: f64,
}
