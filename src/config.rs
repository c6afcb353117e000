//! Runtime configuration
//!
//! [`ApiConfig`] holds the upstream connection settings, [`ExtractorConfig`]
//! the run tunables. Both are built by the CLI layer and treated as opaque
//! values by the extraction core.

use std::path::PathBuf;
use std::time::Duration;

use crate::downloader::config::{
    BATCH_SIZE, INITIAL_BACKOFF_MS, MAX_ATTEMPTS, MAX_RPS, RANGE_DELAY_MS,
};
use crate::downloader::job::YearMonth;
use crate::fetcher::pagination::PageMode;

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required value missing or empty
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    /// Value present but unusable
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// HTTP client could not be built
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Upstream API connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Base URL, e.g. `https://api.example.com/v1`
    pub base_url: String,
    /// Value of the `Authorization` header
    pub user_token: String,
    /// Value of the `Company` header
    pub company_token: String,
}

impl ApiConfig {
    /// Reject empty values and non-HTTP base URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("BASE_URL"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.user_token.trim().is_empty() {
            return Err(ConfigError::Missing("USER_TOKEN"));
        }
        if self.company_token.trim().is_empty() {
            return Err(ConfigError::Missing("ENTERPRISE_TOKEN"));
        }
        Ok(())
    }
}

/// Extraction run tunables
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorConfig {
    /// First month to extract
    pub start: YearMonth,
    /// Last month to extract (inclusive)
    pub end: YearMonth,
    /// Root directory for spreadsheets
    pub data_dir: PathBuf,
    /// Request rate ceiling
    pub max_rps: u32,
    /// Attempts per logical request
    pub max_attempts: u32,
    /// Base delay of the exponential backoff
    pub backoff_base: Duration,
    /// Records enriched concurrently
    pub batch_size: usize,
    /// Pause between two date ranges
    pub range_delay: Duration,
    /// Sequential or bounded-concurrent page retrieval
    pub page_mode: PageMode,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            start: YearMonth::new(2023, 1),
            end: YearMonth::new(2025, 12),
            data_dir: PathBuf::from("data"),
            max_rps: MAX_RPS,
            max_attempts: MAX_ATTEMPTS,
            backoff_base: Duration::from_millis(INITIAL_BACKOFF_MS),
            batch_size: BATCH_SIZE,
            range_delay: Duration::from_millis(RANGE_DELAY_MS),
            page_mode: PageMode::Sequential,
        }
    }
}

impl ExtractorConfig {
    /// Check tunables for values that would stall or skip the run
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rps == 0 {
            return Err(ConfigError::Invalid("max rps must be at least 1".into()));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("max attempts must be at least 1".into()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch size must be at least 1".into()));
        }
        if let PageMode::Concurrent(0) = self.page_mode {
            return Err(ConfigError::Invalid(
                "concurrent pages must be at least 1".into(),
            ));
        }
        if self.start > self.end {
            return Err(ConfigError::Invalid(format!(
                "start {} is after end {}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}
