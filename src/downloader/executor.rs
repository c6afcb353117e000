//! Range-by-range orchestration of an extraction
//!
//! Date ranges run strictly one after another so every range shares the single
//! rate limiter without interference. A range that fetches nothing is not
//! exported; a range whose export fails is logged and the run moves on.

use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use tracing::{error, info, warn};

use crate::downloader::enrich::{EnrichedRecord, EnrichmentPipeline, PrimaryRecord};
use crate::downloader::job::DateRange;
use crate::downloader::stats::StatsSnapshot;
use crate::metrics;
use crate::output::{OutputNaming, RecordExporter};
use crate::shutdown::SharedShutdown;

/// What happened to one date range
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RangeOutcome {
    /// Records written to `path`
    Exported {
        /// Spreadsheet path
        path: PathBuf,
        /// Records written
        records: usize,
    },
    /// Nothing listed for the range
    Empty,
    /// Records fetched but the export failed
    ExportFailed {
        /// Records that were not written
        records: usize,
        /// Exporter error
        error: String,
    },
    /// Not started because shutdown was requested
    Skipped,
}

/// Outcome and request statistics of one range
#[derive(Debug, Clone, Serialize)]
pub struct RangeReport {
    /// Range label, `DD-MM-YYYY / DD-MM-YYYY`
    pub range: String,
    /// Year of the range
    pub year: i32,
    /// Month of the range
    pub month: u32,
    /// Outcome
    #[serde(flatten)]
    pub outcome: RangeOutcome,
    /// Request statistics; zeroed for skipped ranges
    pub stats: StatsSnapshot,
}

/// Per-range outcomes of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Pipeline label (`dte`, `estimate`)
    pub pipeline: &'static str,
    /// One entry per requested range, in order
    pub ranges: Vec<RangeReport>,
}

impl RunReport {
    fn count(&self, matches: impl Fn(&RangeOutcome) -> bool) -> usize {
        self.ranges.iter().filter(|r| matches(&r.outcome)).count()
    }

    /// Ranges written to disk
    pub fn exported(&self) -> usize {
        self.count(|o| matches!(o, RangeOutcome::Exported { .. }))
    }

    /// Ranges without records
    pub fn empty(&self) -> usize {
        self.count(|o| matches!(o, RangeOutcome::Empty))
    }

    /// Ranges whose export failed
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RangeOutcome::ExportFailed { .. }))
    }

    /// Ranges skipped on shutdown
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, RangeOutcome::Skipped))
    }

    /// Records written across all ranges
    pub fn records_exported(&self) -> usize {
        self.ranges
            .iter()
            .map(|r| match r.outcome {
                RangeOutcome::Exported { records, .. } => records,
                _ => 0,
            })
            .sum()
    }

    /// Records lost across all ranges
    pub fn data_loss(&self) -> u64 {
        self.ranges.iter().map(|r| r.stats.data_loss).sum()
    }
}

/// Runs one pipeline over a sequence of date ranges
pub struct Orchestrator<R: PrimaryRecord> {
    pipeline: EnrichmentPipeline<R>,
    exporter: Arc<dyn RecordExporter<R>>,
    naming: OutputNaming,
    range_delay: Duration,
    shutdown: Option<SharedShutdown>,
    progress: Option<ProgressBar>,
}

impl<R: PrimaryRecord> Orchestrator<R> {
    /// Orchestrator pausing `range_delay` between ranges
    pub fn new(
        pipeline: EnrichmentPipeline<R>,
        exporter: Arc<dyn RecordExporter<R>>,
        naming: OutputNaming,
        range_delay: Duration,
    ) -> Self {
        Self {
            pipeline,
            exporter,
            naming,
            range_delay,
            shutdown: None,
            progress: None,
        }
    }

    /// Attach a shared shutdown handle checked between ranges.
    pub fn with_shutdown(mut self, shutdown: SharedShutdown) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Advance `progress` by one per range
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Run every range in order
    pub async fn run(&self, ranges: &[DateRange]) -> RunReport {
        let mut reports = Vec::with_capacity(ranges.len());
        info!(pipeline = R::LABEL, ranges = ranges.len(), dir = %self.naming.dir().display(), "Starting extraction");

        for (index, range) in ranges.iter().enumerate() {
            if self.shutdown_requested() {
                warn!(pipeline = R::LABEL, range = %range, "Shutdown requested, skipping range");
                reports.push(report(range, RangeOutcome::Skipped, StatsSnapshot::default()));
                continue;
            }

            if let Some(pb) = &self.progress {
                pb.set_message(range.to_string());
            }

            let records = self.pipeline.run(range).await;
            let stats = self.pipeline.context().stats().snapshot();
            let outcome = self.export(range, records).await;
            reports.push(report(range, outcome, stats));

            if let Some(pb) = &self.progress {
                pb.inc(1);
            }

            if index + 1 < ranges.len() {
                self.pause().await;
            }
        }

        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }

        let report = RunReport {
            pipeline: R::LABEL,
            ranges: reports,
        };
        info!(
            pipeline = R::LABEL,
            exported = report.exported(),
            empty = report.empty(),
            failed = report.failed(),
            skipped = report.skipped(),
            records = report.records_exported(),
            data_loss = report.data_loss(),
            "Extraction finished"
        );
        report
    }

    async fn export(&self, range: &DateRange, records: Vec<EnrichedRecord<R>>) -> RangeOutcome {
        if records.is_empty() {
            info!(pipeline = R::LABEL, range = %range, "No records, nothing to export");
            return RangeOutcome::Empty;
        }

        let path = self.naming.path_for(range);
        let count = records.len();
        let exporter = self.exporter.clone();
        let target = path.clone();
        let written =
            tokio::task::spawn_blocking(move || exporter.export(&records, &target)).await;

        let result = match written {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("export task failed: {e}")),
        };

        match result {
            Ok(()) => {
                metrics::record_range_export(R::LABEL, true);
                info!(pipeline = R::LABEL, range = %range, path = %path.display(), records = count, "Range exported");
                RangeOutcome::Exported {
                    path,
                    records: count,
                }
            }
            Err(error) => {
                metrics::record_range_export(R::LABEL, false);
                error!(pipeline = R::LABEL, range = %range, path = %path.display(), %error, "Export failed, continuing with next range");
                RangeOutcome::ExportFailed {
                    records: count,
                    error,
                }
            }
        }
    }

    async fn pause(&self) {
        match &self.shutdown {
            Some(shutdown) => {
                tokio::select! {
                    _ = tokio::time::sleep(self.range_delay) => {}
                    _ = shutdown.wait() => {}
                }
            }
            None => tokio::time::sleep(self.range_delay).await,
        }
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .map(|s| s.is_requested())
            .unwrap_or(false)
    }
}

fn report(range: &DateRange, outcome: RangeOutcome, stats: StatsSnapshot) -> RangeReport {
    RangeReport {
        range: range.range_filter(),
        year: range.year,
        month: range.month,
        outcome,
        stats,
    }
}
