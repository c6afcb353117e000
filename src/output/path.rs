//! Deterministic output file naming
//!
//! One file per date range: `<dir>/<prefix>_<YYYY>_<MM>.xlsx`.

use std::path::{Path, PathBuf};

use super::{OutputError, OutputResult};
use crate::downloader::job::DateRange;

/// Directory and file prefix of one pipeline's exports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNaming {
    dir: PathBuf,
    prefix: String,
}

impl OutputNaming {
    /// Files named `<prefix>_<YYYY>_<MM>.xlsx` under `dir`
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: sanitize(&prefix.into()),
        }
    }

    /// DTE exports: `<data_dir>/dtes_type<doc>_<YYYY>_<MM>.xlsx`
    pub fn dtes(data_dir: &Path, type_document: u32) -> Self {
        Self::new(data_dir, format!("dtes_type{type_document}"))
    }

    /// Estimate exports: `<data_dir>/estimates/estimates_<YYYY>_<MM>.xlsx`
    pub fn estimates(data_dir: &Path) -> Self {
        Self::new(data_dir.join("estimates"), "estimates")
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a range
    pub fn file_name(&self, year: i32, month: u32) -> String {
        format!("{}_{:04}_{:02}.xlsx", self.prefix, year, month)
    }

    /// Full path for a range
    pub fn path_for(&self, range: &DateRange) -> PathBuf {
        self.dir.join(self.file_name(range.year, range.month))
    }
}

/// Create the parent directory of `path` if needed
pub fn ensure_parent_dir(path: &Path) -> OutputResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            OutputError::IoError(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }
    Ok(())
}

/// Keep prefixes to a single path component
fn sanitize(prefix: &str) -> String {
    prefix
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c => c,
        })
        .collect::<String>()
        .replace("..", "_")
}
