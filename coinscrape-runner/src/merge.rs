//! Series merge: per-entity history into one dataset.
//!
//! Pure concatenation with column augmentation. Groups stay in universe
//! order, rows inside a group stay in page order. Nothing is deduplicated
//! or re-sorted.

use chrono::NaiveDate;
use coinscrape_core::cell::Cell;
use coinscrape_core::history::HistorySeries;

/// One entity's parsed history plus its identity.
#[derive(Debug, Clone)]
pub struct EntitySeries {
    pub slug: String,
    pub symbol: String,
    pub series: HistorySeries,
}

/// An observation stamped with its entity.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedRow {
    pub date: NaiveDate,
    /// Aligned with [`MergedDataset::columns`].
    pub values: Vec<Cell>,
    pub slug: String,
    pub symbol: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergedDataset {
    /// Metric columns: union of all entities' columns, first-seen order.
    pub columns: Vec<String>,
    pub rows: Vec<MergedRow>,
}

impl MergedDataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Output header: `date`, metric columns, `slug`, `symbol`.
    pub fn header(&self) -> Vec<&str> {
        std::iter::once("date")
            .chain(self.columns.iter().map(|c| c.as_str()))
            .chain(["slug", "symbol"])
            .collect()
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.values.get(idx)
    }

    /// Slugs in group order, each listed once per contiguous group.
    pub fn group_order(&self) -> Vec<&str> {
        let mut order: Vec<&str> = Vec::new();
        for row in &self.rows {
            if order.last() != Some(&row.slug.as_str()) {
                order.push(&row.slug);
            }
        }
        order
    }
}

/// Concatenate `groups` in the order given.
pub fn merge_series<I>(groups: I) -> MergedDataset
where
    I: IntoIterator<Item = EntitySeries>,
{
    let groups: Vec<EntitySeries> = groups.into_iter().collect();

    let mut columns: Vec<String> = Vec::new();
    for g in &groups {
        for c in &g.series.columns {
            if !columns.contains(c) {
                columns.push(c.clone());
            }
        }
    }

    let total: usize = groups.iter().map(|g| g.series.len()).sum();
    let mut rows = Vec::with_capacity(total);

    for g in groups {
        let EntitySeries {
            slug,
            symbol,
            series,
        } = g;

        if series.columns == columns {
            for obs in series.rows {
                rows.push(MergedRow {
                    date: obs.date,
                    values: obs.values,
                    slug: slug.clone(),
                    symbol: symbol.clone(),
                });
            }
            continue;
        }

        let source: Vec<Option<usize>> = columns
            .iter()
            .map(|c| series.columns.iter().position(|sc| sc == c))
            .collect();
        for obs in series.rows {
            let values = source
                .iter()
                .map(|idx| {
                    idx.and_then(|i| obs.values.get(i).cloned())
                        .unwrap_or(Cell::Missing)
                })
                .collect();
            rows.push(MergedRow {
                date: obs.date,
                values,
                slug: slug.clone(),
                symbol: symbol.clone(),
            });
        }
    }

    MergedDataset { columns, rows }
}
