//! Listing page parser: the universe of entities with snapshot metrics.

use crate::cell::Cell;
use crate::data::provider::DataError;
use crate::table::{extract_table, ExtractPolicy, HeaderNaming};
use serde::Serialize;

/// Numeric override attributes on listing cells, in precedence order.
pub const LISTING_NUMERIC_ATTRIBUTES: [&str; 2] = ["data-usd", "data-supply"];

/// Row ordinal and display-name columns; both duplicate other data.
pub const LISTING_REDUNDANT_COLUMNS: [&str; 2] = ["#", "name"];

/// One listed entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingEntry {
    pub slug: String,
    pub symbol: String,
    /// Remaining snapshot columns, aligned with [`Listing::metric_columns`].
    pub metrics: Vec<Cell>,
}

/// The full listing, in page order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Listing {
    pub metric_columns: Vec<String>,
    pub entries: Vec<ListingEntry>,
}

impl Listing {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn listing_policy() -> ExtractPolicy {
    ExtractPolicy::new("table")
        .with_headers(HeaderNaming::Attribute {
            name: "id".into(),
            strip_chars: 3,
            fallback: "th-#".into(),
        })
        .with_row_key("id", "id-")
        .with_numeric_attributes(&LISTING_NUMERIC_ATTRIBUTES)
        .with_link_unwrap(true)
}

/// Parse the listing page body. Slug uniqueness is taken on trust.
pub fn parse_listing(body: &str) -> Result<Listing, DataError> {
    let mut table = extract_table(body, &listing_policy())?;
    table.drop_columns(&LISTING_REDUNDANT_COLUMNS);

    let symbol_idx = table
        .column_index("symbol")
        .ok_or_else(|| DataError::markup("listing table has no 'symbol' column"))?;

    let (mut columns, rows) = table.into_parts();
    columns.remove(symbol_idx);

    let entries = rows
        .into_iter()
        .map(|mut row| {
            let slug = row
                .key
                .take()
                .ok_or_else(|| DataError::markup("listing row without slug"))?;
            let symbol = row.cells.remove(symbol_idx).to_string();
            Ok(ListingEntry {
                slug,
                symbol,
                metrics: row.cells,
            })
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    Ok(Listing {
        metric_columns: columns,
        entries,
    })
}
