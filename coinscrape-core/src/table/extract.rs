//! Generic HTML table extraction.
//!
//! Walks `thead > th` for column names and `tbody > tr > td` for values,
//! resolving each cell through an [`ExtractPolicy`]. Knows nothing about the
//! pages it is used on; callers drop redundant columns themselves.

use super::policy::{ExtractPolicy, HeaderNaming};
use crate::cell::Cell;
use crate::data::provider::DataError;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

/// One body row: optional entity key plus cells in column order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub key: Option<String>,
    pub cells: Vec<Cell>,
}

/// Column names and rows extracted from one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(columns: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Remove every column whose name is in `names`, keeping order.
    pub fn drop_columns(&mut self, names: &[&str]) {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|c| !names.contains(&c.as_str()))
            .collect();
        let mut flags = keep.iter();
        self.columns.retain(|_| *flags.next().unwrap_or(&true));
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.cells.retain(|_| *flags.next().unwrap_or(&true));
        }
    }

    pub fn into_parts(self) -> (Vec<String>, Vec<RawRow>) {
        (self.columns, self.rows)
    }
}

/// Extract the table located by `policy.table` from `body`.
///
/// Fails with [`DataError::MarkupStructure`] when the table, its header or
/// body is absent, a keyed row lacks its key attribute, or a row's cell count
/// differs from the header's. Unparsable numeric attributes never fail.
pub fn extract_table(body: &str, policy: &ExtractPolicy) -> Result<RawTable, DataError> {
    let table_sel = Selector::parse(&policy.table).map_err(|e| DataError::InvalidSelector {
        selector: policy.table.clone(),
        reason: format!("{e:?}"),
    })?;

    let doc = Html::parse_document(body);
    let table = doc
        .select(&table_sel)
        .next()
        .ok_or_else(|| DataError::markup(format!("no table matches '{}'", policy.table)))?;

    let thead = children_named(table, "thead")
        .next()
        .ok_or_else(|| DataError::markup("table has no <thead>"))?;
    let columns: Vec<String> = descendants_named(thead, "th")
        .map(|th| header_name(th, &policy.headers))
        .collect();
    if columns.is_empty() {
        return Err(DataError::markup("table header has no <th> cells"));
    }

    let tbody = children_named(table, "tbody")
        .next()
        .ok_or_else(|| DataError::markup("table has no <tbody>"))?;

    let mut rows = Vec::new();
    for (i, tr) in children_named(tbody, "tr").enumerate() {
        let tds: Vec<ElementRef<'_>> = children_named(tr, "td").collect();

        if let Some(marker) = &policy.empty_marker {
            if tds.first().is_some_and(|td| rendered_text(*td) == *marker) {
                debug!(table = %policy.table, "empty-table marker found");
                return Ok(RawTable::new(columns, Vec::new()));
            }
        }

        let key = match &policy.row_key {
            Some(rk) => {
                let raw = tr.value().attr(&rk.attribute).ok_or_else(|| {
                    DataError::markup(format!("row {i} has no '{}' attribute", rk.attribute))
                })?;
                Some(raw.strip_prefix(rk.strip_prefix.as_str()).unwrap_or(raw).to_string())
            }
            None => None,
        };

        if tds.len() != columns.len() {
            return Err(DataError::markup(format!(
                "row {i} has {} cells, header has {}",
                tds.len(),
                columns.len()
            )));
        }

        let cells = tds.iter().map(|td| resolve_cell(*td, policy)).collect();
        rows.push(RawRow { key, cells });
    }

    Ok(RawTable::new(columns, rows))
}

fn header_name(th: ElementRef<'_>, naming: &HeaderNaming) -> String {
    let attr = match naming {
        HeaderNaming::Attribute { name, .. } => th.value().attr(name),
        HeaderNaming::NormalizedText => None,
    };
    naming.column_name(attr, &th.text().collect::<String>())
}

/// Resolve one `<td>`: link unwrap, then numeric overrides, then text.
///
/// Overrides on the unwrapped link are checked first, then those on the cell
/// itself, so a numeric attribute always beats link text.
fn resolve_cell(td: ElementRef<'_>, policy: &ExtractPolicy) -> Cell {
    let target = if policy.unwrap_link {
        descendants_named(td, "a").next().unwrap_or(td)
    } else {
        td
    };

    for el in [target, td] {
        for attr in &policy.numeric_attributes {
            if let Some(raw) = el.value().attr(attr).filter(|v| !v.is_empty()) {
                let cell = Cell::parse_numeric(raw);
                if cell.is_missing() {
                    debug!(attribute = %attr, value = %raw, "unparsable numeric attribute");
                }
                return cell;
            }
        }
    }

    Cell::Text(rendered_text(target))
}

/// Text content with whitespace runs collapsed to one space, trimmed.
pub(crate) fn rendered_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn children_named<'a>(
    el: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == name)
}

fn descendants_named<'a>(
    el: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    el.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(move |c| c.value().name() == name)
}
