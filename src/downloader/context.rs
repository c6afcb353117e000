//! Explicitly-owned state shared by every task of an extraction
//!
//! One [`ExtractionContext`] per process run, handed around as an `Arc`. It
//! owns the retrying fetcher (and through it the rate limiter and run
//! statistics) and the reference cache.

use std::sync::Arc;

use crate::config::ExtractorConfig;
use crate::downloader::rate_limit::RateLimiter;
use crate::downloader::stats::RunStatistics;
use crate::fetcher::pagination::PageMode;
use crate::fetcher::reference_cache::ReferenceCache;
use crate::fetcher::retry::{RetryPolicy, RetryingFetcher};
use crate::fetcher::ApiTransport;

/// Shared extraction state
pub struct ExtractionContext {
    /// Gateway every request goes through
    pub fetcher: RetryingFetcher,
    /// Reference entities of the run
    pub cache: ReferenceCache,
    /// Page retrieval mode
    pub page_mode: PageMode,
    /// Records enriched concurrently
    pub batch_size: usize,
}

impl ExtractionContext {
    /// Build the context for `transport` with the tunables of `config`
    pub fn new(transport: Arc<dyn ApiTransport>, config: &ExtractorConfig) -> Self {
        let policy = RetryPolicy {
            max_attempts: config.max_attempts,
            backoff_base: config.backoff_base,
            ..Default::default()
        };
        let fetcher = RetryingFetcher::new(
            transport,
            Arc::new(RateLimiter::per_second(config.max_rps)),
            Arc::new(RunStatistics::new()),
            policy,
        );

        Self {
            fetcher,
            cache: ReferenceCache::new(),
            page_mode: config.page_mode,
            batch_size: config.batch_size.max(1),
        }
    }

    /// Statistics of the current run
    pub fn stats(&self) -> &Arc<RunStatistics> {
        self.fetcher.stats()
    }

    /// Shared rate limiter
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.fetcher.limiter()
    }
}
