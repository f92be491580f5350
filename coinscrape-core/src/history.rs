//! History page parser: one entity's dated observations.
//!
//! Row order is the page's order (most recent first upstream) and is never
//! re-sorted. A page whose body reads [`NO_DATA_MARKER`] is an empty series,
//! not an error.

use crate::cell::Cell;
use crate::data::provider::DataError;
use crate::table::{extract_table, ExtractPolicy};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

pub const HISTORY_TABLE_SELECTOR: &str = "#historical-data table";
pub const HISTORY_NUMERIC_ATTRIBUTE: &str = "data-format-value";
pub const NO_DATA_MARKER: &str = "No data was found for the selected time period.";
pub const DATE_COLUMN: &str = "date";

/// Date formats accepted in the `date` column, tried in order.
const DATE_FORMATS: [&str; 6] = [
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%m/%d/%Y",
    "%Y%m%d",
];

/// One day of one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    /// Aligned with [`HistorySeries::columns`].
    pub values: Vec<Cell>,
}

/// An entity's series. `columns` excludes the date column.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HistorySeries {
    pub columns: Vec<String>,
    pub rows: Vec<Observation>,
}

impl HistorySeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(idx)
    }
}

pub fn history_policy() -> ExtractPolicy {
    ExtractPolicy::new(HISTORY_TABLE_SELECTOR)
        .with_numeric_attributes(&[HISTORY_NUMERIC_ATTRIBUTE])
        .with_empty_marker(NO_DATA_MARKER)
}

/// Parse one history page body.
pub fn parse_history(body: &str) -> Result<HistorySeries, DataError> {
    let table = extract_table(body, &history_policy())?;
    let date_idx = table
        .column_index(DATE_COLUMN)
        .ok_or_else(|| DataError::markup("history table has no 'date' column"))?;

    let (mut columns, raw_rows) = table.into_parts();
    columns.remove(date_idx);

    let mut seen = HashSet::with_capacity(raw_rows.len());
    let mut rows = Vec::with_capacity(raw_rows.len());
    for mut raw in raw_rows {
        let date = match raw.cells.remove(date_idx) {
            Cell::Text(text) => parse_observation_date(&text)?,
            other => {
                return Err(DataError::markup(format!(
                    "date cell is not text: {other:?}"
                )))
            }
        };
        if !seen.insert(date) {
            return Err(DataError::markup(format!("duplicate date {date} in history")));
        }
        rows.push(Observation {
            date,
            values: raw.cells,
        });
    }

    Ok(HistorySeries { columns, rows })
}

/// Parse a rendered date such as `Jan 03, 2024` or `2024-01-03`.
pub fn parse_observation_date(text: &str) -> Result<NaiveDate, DataError> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .ok_or_else(|| DataError::markup(format!("unparsable date '{text}'")))
}
