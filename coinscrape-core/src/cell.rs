//! Cell values resolved from table markup.
//!
//! A cell is either numeric or textual, never both. Numeric cells come from
//! override attributes (`data-usd`, `data-format-value`, …); when such an
//! attribute is present but unparsable the cell becomes [`Cell::Missing`]
//! instead of falling back to the rendered text.

use serde::Serialize;
use std::fmt;

/// A single resolved table cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Cell {
    /// Decimal value read from a numeric override attribute.
    Number(f64),
    /// A numeric override attribute was present but could not be parsed.
    Missing,
    /// Rendered text of the cell (whitespace collapsed).
    Text(String),
}

impl Cell {
    /// Parse a numeric override attribute value.
    ///
    /// Surrounding whitespace is ignored. Anything that does not parse to a
    /// finite `f64` becomes [`Cell::Missing`].
    pub fn parse_numeric(raw: &str) -> Self {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Cell::Number(v),
            _ => Cell::Missing,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

/// Delimited-output rendering: numbers as decimal text, missing as empty.
impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(v) => write!(f, "{v}"),
            Cell::Missing => Ok(()),
            Cell::Text(s) => f.write_str(s),
        }
    }
}
