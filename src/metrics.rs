//! Observability metrics for the extractor
//!
//! Counters and histograms describing upstream API health: request outcomes,
//! 403 throttling, retries, and per-range export results.
//!
//! ## Architecture
//!
//! - Uses the `metrics` crate facade; without an installed recorder every
//!   macro call is a no-op
//! - Optional Prometheus exporter for a scrape endpoint (`--metrics-addr`)
//! - Request correlation ids tie the per-attempt log lines together

use metrics::{counter, describe_counter, describe_histogram, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

static CORRELATION_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Metrics exporter installation errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Prometheus exporter could not be installed
    #[error("failed to install Prometheus exporter: {0}")]
    Install(String),
}

/// Initialize the Prometheus exporter
///
/// Idempotent; later calls are ignored once an exporter is installed.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        debug!("Metrics already initialized, skipping");
        return Ok(());
    }

    info!(%addr, "Initializing metrics exporter");

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        METRICS_INITIALIZED.store(false, Ordering::SeqCst);
        return Err(MetricsError::Install(e.to_string()));
    }

    describe_counter!(
        "api_requests_total",
        Unit::Count,
        "Total number of HTTP requests made to the upstream API"
    );
    describe_counter!(
        "api_rate_limited_total",
        Unit::Count,
        "Total number of 403 responses (upstream throttling)"
    );
    describe_counter!(
        "api_retries_total",
        Unit::Count,
        "Total number of retry attempts"
    );
    describe_counter!(
        "api_failed_after_retries_total",
        Unit::Count,
        "Logical requests that exhausted every attempt"
    );
    describe_counter!(
        "api_data_loss_total",
        Unit::Count,
        "Critical fetches or records lost after retries"
    );
    describe_histogram!(
        "api_request_duration_seconds",
        Unit::Seconds,
        "HTTP request duration in seconds"
    );
    describe_histogram!(
        "retry_backoff_duration_seconds",
        Unit::Seconds,
        "Duration of retry backoff in seconds"
    );
    describe_counter!(
        "ranges_exported_total",
        Unit::Count,
        "Date ranges written to a spreadsheet"
    );
    describe_counter!(
        "ranges_failed_total",
        Unit::Count,
        "Date ranges whose export failed"
    );

    Ok(())
}

/// Generate a new correlation id for request tracing
pub fn generate_correlation_id() -> String {
    let id = CORRELATION_COUNTER.fetch_add(1, Ordering::Relaxed) + 1;
    format!("req-{id:08x}")
}

/// Timing and outcome of one HTTP request
pub struct HttpRequestMetrics {
    endpoint: String,
    start_time: Instant,
    correlation_id: String,
}

impl HttpRequestMetrics {
    /// Start recording a request to `endpoint`
    pub fn start(endpoint: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        let correlation_id = generate_correlation_id();

        debug!(
            correlation_id = %correlation_id,
            endpoint = %endpoint,
            "Starting HTTP request"
        );

        Self {
            endpoint,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record a response with the given status
    pub fn record_complete(&self, status_code: u16) {
        let duration = self.start_time.elapsed();

        counter!(
            "api_requests_total",
            "status" => status_code.to_string(),
        )
        .increment(1);

        histogram!("api_request_duration_seconds").record(duration.as_secs_f64());

        if status_code == 403 {
            counter!("api_rate_limited_total").increment(1);

            warn!(
                correlation_id = %self.correlation_id,
                endpoint = %self.endpoint,
                duration_ms = duration.as_millis() as u64,
                "Throttled (403) response recorded"
            );
        }

        debug!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            status = status_code,
            duration_ms = duration.as_millis() as u64,
            "HTTP request completed"
        );
    }

    /// Record a transport failure (no status code)
    pub fn record_network_error(&self) {
        let duration = self.start_time.elapsed();

        counter!(
            "api_requests_total",
            "status" => "network_error",
        )
        .increment(1);

        histogram!("api_request_duration_seconds").record(duration.as_secs_f64());

        warn!(
            correlation_id = %self.correlation_id,
            endpoint = %self.endpoint,
            duration_ms = duration.as_millis() as u64,
            "Network error recorded"
        );
    }

    /// Correlation id of this request
    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }
}

/// Record a retry backoff
pub fn record_retry_backoff(duration: Duration, attempt: u32) {
    counter!(
        "api_retries_total",
        "attempt" => attempt.to_string(),
    )
    .increment(1);

    histogram!("retry_backoff_duration_seconds").record(duration.as_secs_f64());
}

/// Record a logical request that exhausted its attempts
pub fn record_failed_after_retries(critical: bool) {
    counter!("api_failed_after_retries_total").increment(1);
    if critical {
        record_data_loss();
    }
}

/// Record one lost record or critical payload
pub fn record_data_loss() {
    counter!("api_data_loss_total").increment(1);
}

/// Record the outcome of a range export
pub fn record_range_export(pipeline: &'static str, success: bool) {
    if success {
        counter!("ranges_exported_total", "pipeline" => pipeline).increment(1);
    } else {
        counter!("ranges_failed_total", "pipeline" => pipeline).increment(1);
    }
}
