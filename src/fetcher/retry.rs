//! Bounded retries with exponential backoff
//!
//! Every request to the upstream API goes through [`RetryingFetcher::fetch`]:
//!
//! 1. acquire a slot from the shared [`RateLimiter`]
//! 2. run the operation (exactly one network call)
//! 3. classify a failure: 404 ends the call with an absent result, 403 and
//!    everything else are retried after `2^attempt * base`
//! 4. after the last attempt, record the loss and return `None`
//!
//! Callers never see an error: absence means "field unavailable".

use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use crate::downloader::config::{calculate_backoff_from, INITIAL_BACKOFF_MS, MAX_ATTEMPTS};
use crate::downloader::rate_limit::RateLimiter;
use crate::downloader::stats::RunStatistics;
use crate::fetcher::{parse_envelope, parse_list, ApiTransport, FailureKind, FetchError, FetchResult};
use crate::metrics;
use crate::model::ListPage;

/// Whether terminal failure of a fetch loses data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criticality {
    /// Page and detail fetches; terminal failure counts as data loss
    Critical,
    /// Relation lookups, print documents, reference collections
    NonCritical,
}

/// Maps an error to its retry class
pub type Classifier = fn(&FetchError) -> FailureKind;

/// Retry parameters
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts per logical request, first try included
    pub max_attempts: u32,
    /// Base of the exponential backoff
    pub backoff_base: Duration,
    /// Failure classifier
    pub classifier: Classifier,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(INITIAL_BACKOFF_MS),
            classifier: FetchError::classify,
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        calculate_backoff_from(self.backoff_base, attempt)
    }
}

/// Rate-limited, retrying gateway to the upstream API
pub struct RetryingFetcher {
    transport: Arc<dyn ApiTransport>,
    limiter: Arc<RateLimiter>,
    stats: Arc<RunStatistics>,
    policy: RetryPolicy,
}

impl RetryingFetcher {
    /// Create a fetcher over shared limiter and statistics
    pub fn new(
        transport: Arc<dyn ApiTransport>,
        limiter: Arc<RateLimiter>,
        stats: Arc<RunStatistics>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            transport,
            limiter,
            stats,
            policy,
        }
    }

    /// Statistics this fetcher records into
    pub fn stats(&self) -> &Arc<RunStatistics> {
        &self.stats
    }

    /// Limiter every attempt passes through
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Retry policy in use
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `op` with rate limiting, retries and statistics
    ///
    /// `op` must perform exactly one network call per invocation. Returns
    /// `None` on 404 (immediately) or once every attempt has failed.
    pub async fn fetch<T, F, Fut>(&self, what: &str, criticality: Criticality, mut op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = FetchResult<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            self.limiter.acquire().await;
            self.stats.record_attempt();

            let err = match op().await {
                Ok(value) => {
                    self.stats.record_success();
                    self.limiter.record_success();
                    if attempt > 1 {
                        self.stats.record_successful_retry();
                        debug!(what, attempt, "Succeeded after retry");
                    }
                    return Some(value);
                }
                Err(err) => err,
            };

            match (self.policy.classifier)(&err) {
                FailureKind::NotFound => {
                    self.stats.record_not_found();
                    self.limiter.record_success();
                    debug!(what, "Not found (404)");
                    return None;
                }
                FailureKind::RateLimited => {
                    self.stats.record_rate_limited();
                    self.limiter.record_error();
                    warn!(what, attempt, max_attempts, "Rate limited (403)");
                }
                FailureKind::Other => {
                    self.stats.record_other_error();
                    self.limiter.record_error();
                    warn!(what, attempt, max_attempts, error = %err, "Request failed");
                }
            }
            last_error = Some(err);

            if attempt < max_attempts {
                let delay = self.policy.backoff(attempt);
                self.stats.record_retry();
                metrics::record_retry_backoff(delay, attempt);
                debug!(what, attempt, delay_ms = delay.as_millis() as u64, "Backing off before retry");
                tokio::time::sleep(delay).await;
            }
        }

        self.stats.record_failed_after_retries();
        let critical = criticality == Criticality::Critical;
        if critical {
            self.stats.record_data_loss();
        }
        metrics::record_failed_after_retries(critical);

        let last_error = last_error.map(|e| e.to_string()).unwrap_or_default();
        if critical {
            error!(what, attempts = max_attempts, error = %last_error, "Giving up, data lost");
        } else {
            warn!(what, attempts = max_attempts, error = %last_error, "Giving up, field left unset");
        }
        None
    }

    /// GET `path` and decode its `{data: T}` envelope
    pub async fn get_entity<T>(&self, path: &str, what: &str, criticality: Criticality) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let transport = &self.transport;
        self.fetch(what, criticality, || async move {
            parse_envelope(transport.get_json(path, &[]).await?)
        })
        .await
    }

    /// GET one page of a collection and decode the records under `key`
    pub async fn get_page<T>(
        &self,
        path: &str,
        key: &str,
        query: &[(&str, String)],
        what: &str,
        criticality: Criticality,
    ) -> Option<ListPage<T>>
    where
        T: DeserializeOwned,
    {
        let transport = &self.transport;
        self.fetch(what, criticality, || async move {
            parse_list(transport.get_json(path, query).await?, key)
        })
        .await
    }
}
