//! Spreadsheet output of enriched records

use std::path::Path;

use crate::downloader::enrich::{EnrichedRecord, PrimaryRecord};

pub mod path;
pub mod sheets;
pub mod xlsx;

pub use path::OutputNaming;
pub use xlsx::XlsxExporter;

/// Output errors
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    /// IO error
    #[error("IO error: {0}")]
    IoError(String),

    /// Spreadsheet write error
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    /// Nothing to write
    #[error("refusing to write an empty export to {0}")]
    Empty(String),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes one date range of enriched records to `path`
///
/// Callers only invoke this with a non-empty slice.
pub trait RecordExporter<R: PrimaryRecord>: Send + Sync {
    /// Write `records` to `path`, replacing any existing file
    fn export(&self, records: &[EnrichedRecord<R>], path: &Path) -> OutputResult<()>;
}
