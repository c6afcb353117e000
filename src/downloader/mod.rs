//! Extraction orchestration and rate limiting
//!
//! # Overview
//!
//! An extraction walks a sequence of monthly [`DateRange`]s:
//!
//! 1. **Context**: one [`ExtractionContext`] owns the rate limiter, run
//!    statistics, retrying fetcher and reference cache for the whole process
//! 2. **Enrichment**: [`EnrichmentPipeline`] lists one range and joins every
//!    record with its detail payload and reference entities
//! 3. **Orchestration**: [`Orchestrator`] runs ranges one after another and
//!    hands non-empty results to the exporter
//!
//! # Components
//!
//! - [`rate_limit`] - global request spacing with error-driven throttling
//! - [`stats`] - per-run request counters
//! - [`config`] - constants and backoff calculation
//! - [`job`] - months and date ranges
//! - [`context`] - shared extraction state
//! - [`enrich`] - per-range enrichment
//! - [`executor`] - range-by-range orchestration
//!
//! # Error Handling
//!
//! Nothing in this module returns an error to the caller. Failed requests are
//! retried, counted in [`RunStatistics`] and degrade the affected record; a
//! failed export is reported as [`RangeOutcome::ExportFailed`].
//!
//! # Related Modules
//!
//! - [`crate::fetcher`] - HTTP transport, retries, pagination, reference cache
//! - [`crate::output`] - spreadsheet export

pub mod config;
pub mod context;
pub mod enrich;
pub mod executor;
pub mod job;
pub mod rate_limit;
pub mod stats;

pub use context::ExtractionContext;
pub use enrich::{EnrichedRecord, EnrichmentPipeline, PrimaryRecord};
pub use executor::{Orchestrator, RangeOutcome, RangeReport, RunReport};
pub use job::{generate_date_ranges, DateRange, YearMonth};
pub use rate_limit::RateLimiter;
pub use stats::{RunStatistics, StatsSnapshot, SummaryPercentages};
