//! Date ranges driving one enrichment run and one output file each

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar month, ordered chronologically
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
}

impl YearMonth {
    /// Create a month; `month` is clamped to 1-12
    pub fn new(year: i32, month: u32) -> Self {
        Self {
            year,
            month: month.clamp(1, 12),
        }
    }

    /// The month after this one
    pub fn next(self) -> Self {
        if self.month == 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }

    fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    fn last_day(self) -> Option<NaiveDate> {
        self.next().first_day()?.pred_opt()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Month parse errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid month '{0}', expected YYYY-MM")]
pub struct YearMonthParseError(String);

impl FromStr for YearMonth {
    type Err = YearMonthParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || YearMonthParseError(s.to_string());
        let (year, month) = s.trim().split_once('-').ok_or_else(err)?;
        let year: i32 = year.parse().map_err(|_| err())?;
        let month: u32 = month.parse().map_err(|_| err())?;
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(err());
        }
        Ok(Self { year, month })
    }
}

/// One calendar month of extraction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First day, `DD-MM-YYYY`
    pub start_date: String,
    /// Last day, `DD-MM-YYYY`
    pub end_date: String,
    /// Year
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
}

impl DateRange {
    /// Range covering `month`
    pub fn for_month(month: YearMonth) -> Option<Self> {
        let first = month.first_day()?;
        let last = month.last_day()?;
        Some(Self {
            start_date: format_date(first),
            end_date: format_date(last),
            year: first.year(),
            month: first.month(),
        })
    }

    /// List filter value, `DD-MM-YYYY / DD-MM-YYYY`
    pub fn range_filter(&self) -> String {
        format!("{} / {}", self.start_date, self.end_date)
    }

    /// Month this range covers
    pub fn year_month(&self) -> YearMonth {
        YearMonth::new(self.year, self.month)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d-%m-%Y").to_string()
}

/// One range per month from `start` to `end`, both inclusive
pub fn generate_date_ranges(start: YearMonth, end: YearMonth) -> Vec<DateRange> {
    let mut ranges = Vec::new();
    let mut current = start;
    while current <= end {
        if let Some(range) = DateRange::for_month(current) {
            ranges.push(range);
        }
        current = current.next();
    }
    ranges
}
