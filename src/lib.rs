//! # DTE Extractor Library
//!
//! Batch extraction of electronic tax documents (DTEs) and estimates from a
//! rate-limited invoicing API, enriched with their reference data and written
//! to one spreadsheet per month.
//!
//! ## Features
//!
//! - **Global rate limiting**: one request slot every `1/max_rps` seconds across
//!   all tasks, doubled while recent attempts keep failing
//! - **Retries with backoff**: every call goes through one retrying gateway with
//!   exponential backoff; 404 is a definitive answer and never retried
//! - **Reference cache**: each lookup collection is fetched at most once per
//!   run, with single-flight population under concurrency
//! - **Partial-failure tolerance**: a failed detail or lookup degrades one
//!   record, a failed month never aborts a multi-year run
//! - **Run statistics**: attempts, throttling, retries and data loss per range
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use dte_extractor::config::{ApiConfig, ExtractorConfig};
//! use dte_extractor::downloader::{generate_date_ranges, EnrichmentPipeline, ExtractionContext, Orchestrator};
//! use dte_extractor::fetcher::http::ApiHttpClient;
//! use dte_extractor::model::Dte;
//! use dte_extractor::output::{OutputNaming, XlsxExporter};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = ApiConfig {
//!     base_url: "https://api.example.com/v1".into(),
//!     user_token: "user-token".into(),
//!     company_token: "company-token".into(),
//! };
//! let config = ExtractorConfig::default();
//!
//! let transport = Arc::new(ApiHttpClient::new(&api)?);
//! let ctx = Arc::new(ExtractionContext::new(transport, &config));
//! let pipeline = EnrichmentPipeline::<Dte>::new(ctx).with_filter("type_document", "33");
//!
//! let orchestrator = Orchestrator::new(
//!     pipeline,
//!     Arc::new(XlsxExporter::new()),
//!     OutputNaming::dtes(&config.data_dir, 33),
//!     config.range_delay,
//! );
//! let report = orchestrator
//!     .run(&generate_date_ranges(config.start, config.end))
//!     .await;
//! println!("{} months exported", report.exported());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`model`] - serde data model of the upstream API
//! - [`fetcher`] - HTTP transport, retrying gateway, pagination, reference cache
//! - [`downloader`] - rate limiter, statistics, enrichment and orchestration
//! - [`output`] - file naming and spreadsheet export
//! - [`config`] - connection settings and run tunables
//! - [`cli`] - command line front end

#![warn(missing_docs)]
#![warn(clippy::all)]

/// CLI command implementations
pub mod cli;

/// Connection settings and run tunables
pub mod config;

/// Extraction orchestration
pub mod downloader;

/// Upstream API access
pub mod fetcher;

/// Metrics counters and the optional Prometheus exporter
pub mod metrics;

/// Upstream API data model
pub mod model;

/// Spreadsheet output
pub mod output;

/// Graceful shutdown coordination between date ranges
pub mod shutdown;

// Re-export commonly used types
pub use config::{ApiConfig, ConfigError, ExtractorConfig};
pub use downloader::{DateRange, YearMonth};
pub use fetcher::{FetchError, FetchResult};
