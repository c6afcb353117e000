//! Multi-sheet `.xlsx` writer
//!
//! A [`WorkbookLayout`] turns enriched records into [`Sheet`]s; the
//! [`XlsxExporter`] writes them with a bold, frozen header row. The main sheet
//! is always written; other sheets only when they have rows.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;
use tracing::{debug, info};

use super::path::ensure_parent_dir;
use super::{OutputError, OutputResult, RecordExporter};
use crate::downloader::enrich::{EnrichedRecord, PrimaryRecord};

/// One spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Text
    Text(String),
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Blank
    Empty,
}

impl Cell {
    /// Text cell; `None` becomes blank
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Empty, |s| Self::Text(s.to_string()))
    }

    /// Integer cell; `None` becomes blank
    pub fn int(value: Option<i64>) -> Self {
        value.map_or(Self::Empty, |n| Self::Number(n as f64))
    }

    /// Decimal cell; `None` becomes blank
    pub fn decimal(value: Option<Decimal>) -> Self {
        value
            .and_then(|d| d.to_f64())
            .map_or(Self::Empty, Self::Number)
    }

    /// Boolean cell; `None` becomes blank
    pub fn flag(value: Option<bool>) -> Self {
        value.map_or(Self::Empty, Self::Bool)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

/// A named table
#[derive(Debug, Clone, PartialEq)]
pub struct Sheet {
    /// Worksheet name
    pub name: &'static str,
    /// Column headers
    pub headers: Vec<&'static str>,
    /// Rows, each as long as `headers`
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    /// Empty sheet with headers
    pub fn new(name: &'static str, headers: &[&'static str]) -> Self {
        Self {
            name,
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    /// Append a row
    pub fn push(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.headers.len(), "row width for {}", self.name);
        self.rows.push(row);
    }
}

/// Sheet layout of one record type; the first sheet is the main sheet
pub trait WorkbookLayout: PrimaryRecord {
    /// Sheets for a range of records
    fn sheets(records: &[EnrichedRecord<Self>]) -> Vec<Sheet>;
}

/// Writes enriched records to `.xlsx` files
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxExporter;

impl XlsxExporter {
    /// Create exporter
    pub fn new() -> Self {
        Self
    }

    /// Write sheets to `path`
    pub fn write_sheets(&self, sheets: &[Sheet], path: &Path) -> OutputResult<()> {
        ensure_parent_dir(path)?;

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        for (index, sheet) in sheets.iter().enumerate() {
            if index > 0 && sheet.rows.is_empty() {
                debug!(sheet = sheet.name, "Skipping empty sheet");
                continue;
            }
            let worksheet = workbook.add_worksheet();
            write_sheet(worksheet, sheet, &header_format).map_err(spreadsheet_error)?;
        }

        workbook.save(path).map_err(spreadsheet_error)?;
        Ok(())
    }
}

impl<R: WorkbookLayout> RecordExporter<R> for XlsxExporter {
    fn export(&self, records: &[EnrichedRecord<R>], path: &Path) -> OutputResult<()> {
        if records.is_empty() {
            return Err(OutputError::Empty(path.display().to_string()));
        }

        let sheets = R::sheets(records);
        self.write_sheets(&sheets, path)?;

        info!(
            path = %path.display(),
            records = records.len(),
            sheets = sheets.iter().filter(|s| !s.rows.is_empty()).count(),
            "Spreadsheet written"
        );
        Ok(())
    }
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, header_format: &Format) -> Result<(), XlsxError> {
    worksheet.set_name(sheet.name)?;

    for (col, header) in sheet.headers.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *header, header_format)?;
    }

    for (row_index, row) in sheet.rows.iter().enumerate() {
        let row_num = row_index as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            let col = col as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet.write_string(row_num, col, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row_num, col, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(row_num, col, *b)?;
                }
                Cell::Empty => {}
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofit();
    Ok(())
}

fn spreadsheet_error(e: XlsxError) -> OutputError {
    OutputError::Spreadsheet(e.to_string())
}
