//! Extraction commands (`dtes`, `estimates`)

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::CliError;
use crate::config::{ApiConfig, ConfigError, ExtractorConfig};
use crate::downloader::{
    generate_date_ranges, DateRange, EnrichmentPipeline, ExtractionContext, Orchestrator,
    RangeOutcome, RunReport, YearMonth,
};
use crate::fetcher::http::ApiHttpClient;
use crate::fetcher::pagination::PageMode;
use crate::fetcher::ApiTransport;
use crate::metrics;
use crate::model::{Dte, Estimate};
use crate::output::xlsx::WorkbookLayout;
use crate::output::{OutputNaming, RecordExporter, XlsxExporter};
use crate::shutdown::SharedShutdown;

/// Upper bound for `--concurrent-pages`
const MAX_CONCURRENT_PAGES: usize = 16;

/// Document type of electronic invoices
const DEFAULT_TYPE_DOCUMENT: u32 = 33;

fn parse_concurrent_pages(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;

    if value == 0 {
        return Err("concurrent pages must be at least 1".to_string());
    }
    if value > MAX_CONCURRENT_PAGES {
        return Err(format!(
            "concurrent pages {value} exceeds maximum of {MAX_CONCURRENT_PAGES}"
        ));
    }
    Ok(value)
}

fn parse_batch_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("batch size must be at least 1".to_string()),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("'{s}' is not a valid number")),
    }
}

/// DTE extractor CLI
#[derive(Parser, Debug)]
#[command(name = "dte-extractor")]
#[command(about = "Extract DTEs and estimates into monthly spreadsheets", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL
    #[arg(long, global = true, env = "BASE_URL")]
    pub base_url: Option<String>,

    /// User token sent as the Authorization header
    #[arg(long, global = true, env = "USER_TOKEN", hide_env_values = true)]
    pub user_token: Option<String>,

    /// Company token sent as the Company header
    #[arg(long, global = true, env = "ENTERPRISE_TOKEN", hide_env_values = true)]
    pub company_token: Option<String>,

    /// First month to extract (YYYY-MM)
    #[arg(long, global = true, default_value = "2023-01")]
    pub start: YearMonth,

    /// Last month to extract, inclusive (YYYY-MM)
    #[arg(long, global = true, default_value = "2025-12")]
    pub end: YearMonth,

    /// Root directory for spreadsheets
    #[arg(long, global = true, default_value = "data")]
    pub data_dir: PathBuf,

    /// Request rate ceiling (requests per second)
    #[arg(long, global = true, default_value = "7", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_rps: u32,

    /// Attempts per request (default: 3, range: 1-10)
    #[arg(long, global = true, default_value = "3", value_parser = clap::value_parser!(u32).range(1..=10))]
    pub max_attempts: u32,

    /// Records enriched concurrently
    #[arg(long, global = true, default_value = "20", value_parser = parse_batch_size)]
    pub batch_size: usize,

    /// Pause between two months, in milliseconds
    #[arg(long, global = true, default_value = "2000")]
    pub range_delay_ms: u64,

    /// Fetch list pages with up to N requests in flight (default: one at a time)
    #[arg(long, global = true, value_parser = parse_concurrent_pages)]
    pub concurrent_pages: Option<usize>,

    /// Serve Prometheus metrics on this address (e.g. 127.0.0.1:9000)
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Run summary format (json or human)
    #[arg(long, global = true, default_value = "human")]
    pub output_format: OutputFormat,

    /// Hide the per-month progress bar
    #[arg(long, global = true, default_value_t = false)]
    pub no_progress: bool,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract DTEs of one document type
    Dtes(DtesArgs),

    /// Extract estimates
    Estimates,
}

/// Arguments of the `dtes` command
#[derive(Args, Debug)]
pub struct DtesArgs {
    /// Document type code (33 = electronic invoice)
    #[arg(long, default_value_t = DEFAULT_TYPE_DOCUMENT)]
    pub type_document: u32,
}

/// Run summary formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable output
    Human,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "human" => Ok(OutputFormat::Human),
            _ => Err(format!("Invalid output format: {s}")),
        }
    }
}

impl Cli {
    /// Connection settings from flags and environment
    pub fn api_config(&self) -> Result<ApiConfig, CliError> {
        let required = |value: &Option<String>, name: &'static str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .ok_or(ConfigError::Missing(name))
        };

        let config = ApiConfig {
            base_url: required(&self.base_url, "BASE_URL")?,
            user_token: required(&self.user_token, "USER_TOKEN")?,
            company_token: required(&self.company_token, "ENTERPRISE_TOKEN")?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Run tunables from flags
    pub fn extractor_config(&self) -> Result<ExtractorConfig, CliError> {
        let config = ExtractorConfig {
            start: self.start,
            end: self.end,
            data_dir: self.data_dir.clone(),
            max_rps: self.max_rps,
            max_attempts: self.max_attempts,
            batch_size: self.batch_size,
            range_delay: Duration::from_millis(self.range_delay_ms),
            page_mode: self
                .concurrent_pages
                .map_or(PageMode::Sequential, PageMode::Concurrent),
            ..Default::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Run the selected command and print its summary
    pub async fn execute(&self, shutdown: SharedShutdown) -> Result<RunReport, CliError> {
        let api = self.api_config()?;
        let config = self.extractor_config()?;

        if let Some(addr) = self.metrics_addr {
            metrics::init_metrics(addr)?;
        }

        let transport: Arc<dyn ApiTransport> = Arc::new(ApiHttpClient::new(&api)?);
        let ctx = Arc::new(ExtractionContext::new(transport, &config));
        let ranges = generate_date_ranges(config.start, config.end);

        info!(
            start = %config.start,
            end = %config.end,
            months = ranges.len(),
            max_rps = config.max_rps,
            batch_size = config.batch_size,
            "Configuration loaded"
        );

        let run = RunSettings {
            ranges: &ranges,
            range_delay: config.range_delay,
            shutdown,
            progress: !self.no_progress && self.output_format == OutputFormat::Human,
        };

        let report = match &self.command {
            Commands::Dtes(args) => {
                let pipeline = EnrichmentPipeline::<Dte>::new(ctx)
                    .with_filter("type_document", args.type_document.to_string());
                run.execute(pipeline, OutputNaming::dtes(&config.data_dir, args.type_document))
                    .await
            }
            Commands::Estimates => {
                let pipeline = EnrichmentPipeline::<Estimate>::new(ctx);
                run.execute(pipeline, OutputNaming::estimates(&config.data_dir))
                    .await
            }
        };

        match self.output_format {
            OutputFormat::Json => output_json(&report)?,
            OutputFormat::Human => output_human(&report),
        }
        Ok(report)
    }
}

struct RunSettings<'a> {
    ranges: &'a [DateRange],
    range_delay: Duration,
    shutdown: SharedShutdown,
    progress: bool,
}

impl RunSettings<'_> {
    async fn execute<R: WorkbookLayout>(
        &self,
        pipeline: EnrichmentPipeline<R>,
        naming: OutputNaming,
    ) -> RunReport {
        let exporter: Arc<dyn RecordExporter<R>> = Arc::new(XlsxExporter::new());
        let mut orchestrator = Orchestrator::new(pipeline, exporter, naming, self.range_delay)
            .with_shutdown(self.shutdown.clone());
        if self.progress {
            orchestrator = orchestrator.with_progress(create_progress_bar(self.ranges.len()));
        }
        orchestrator.run(self.ranges).await
    }
}

fn create_progress_bar(months: usize) -> ProgressBar {
    let pb = ProgressBar::new(months as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} months {msg}")
            .expect("hardcoded template is valid")
            .progress_chars("#>-"),
    );
    pb
}

fn output_json(report: &RunReport) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| CliError::ReportError(e.to_string()))?;
    println!("{json}");
    Ok(())
}

fn output_human(report: &RunReport) {
    println!("\nExtraction of {} records finished", report.pipeline);
    for range in &report.ranges {
        let line = match &range.outcome {
            RangeOutcome::Exported { path, records } => {
                format!("{records} records -> {}", path.display())
            }
            RangeOutcome::Empty => "no records".to_string(),
            RangeOutcome::ExportFailed { records, error } => {
                format!("export of {records} records failed: {error}")
            }
            RangeOutcome::Skipped => "skipped".to_string(),
        };
        println!(
            "  {:04}-{:02}: {} (requests: {}, retries: {}, data loss: {})",
            range.year, range.month, line, range.stats.total, range.stats.retries, range.stats.data_loss
        );
    }
    println!(
        "Exported: {}  Empty: {}  Failed: {}  Skipped: {}",
        report.exported(),
        report.empty(),
        report.failed(),
        report.skipped()
    );
    println!("Records written: {}", report.records_exported());
    if report.data_loss() > 0 {
        println!("Data loss: {} records or payloads", report.data_loss());
    }
}
