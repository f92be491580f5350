//! CSV export for merged datasets and listing snapshots.
//!
//! Dataset columns: date, metric columns…, slug, symbol. Numeric cells are
//! written as decimal text, missing numbers as empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use coinscrape_core::listing::Listing;

use crate::merge::MergedDataset;

const DATE_FORMAT: &str = "%Y-%m-%d";

// ─── Dataset ────────────────────────────────────────────────────────

/// Write a merged dataset as CSV to any writer.
pub fn write_dataset_csv<W: Write>(dataset: &MergedDataset, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(dataset.header())?;

    for row in &dataset.rows {
        let mut record = Vec::with_capacity(row.values.len() + 3);
        record.push(row.date.format(DATE_FORMAT).to_string());
        record.extend(row.values.iter().map(|c| c.to_string()));
        record.push(row.slug.clone());
        record.push(row.symbol.clone());
        wtr.write_record(&record)?;
    }

    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

/// Render a merged dataset as a CSV string.
pub fn export_dataset_csv(dataset: &MergedDataset) -> Result<String> {
    let mut buf = Vec::new();
    write_dataset_csv(dataset, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not valid UTF-8")
}

/// Write a merged dataset to `path`, replacing any existing file.
pub fn save_dataset(dataset: &MergedDataset, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_dataset_csv(dataset, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}

// ─── Listing snapshot ───────────────────────────────────────────────

/// Write the listing as CSV: slug, symbol, metric columns….
pub fn write_listing_csv<W: Write>(listing: &Listing, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let header: Vec<&str> = ["slug", "symbol"]
        .into_iter()
        .chain(listing.metric_columns.iter().map(|c| c.as_str()))
        .collect();
    wtr.write_record(&header)?;

    for entry in &listing.entries {
        let mut record = Vec::with_capacity(entry.metrics.len() + 2);
        record.push(entry.slug.clone());
        record.push(entry.symbol.clone());
        record.extend(entry.metrics.iter().map(|c| c.to_string()));
        wtr.write_record(&record)?;
    }

    wtr.flush().context("failed to flush CSV writer")?;
    Ok(())
}

pub fn export_listing_csv(listing: &Listing) -> Result<String> {
    let mut buf = Vec::new();
    write_listing_csv(listing, &mut buf)?;
    String::from_utf8(buf).context("CSV output is not valid UTF-8")
}

pub fn save_listing(listing: &Listing, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_listing_csv(listing, BufWriter::new(file))
        .with_context(|| format!("failed to write {}", path.display()))
}
