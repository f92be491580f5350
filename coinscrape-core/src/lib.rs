//! coinscrape core: cells, table extraction, listing and history parsers.
//!
//! This crate turns page bodies into typed records:
//! - `Cell` values with numeric-override resolution and a missing sentinel
//! - A generic HTML table extractor driven by an `ExtractPolicy`
//! - Listing and history page parsers built on that extractor
//! - The `Fetcher` collaborator trait and a blocking HTTP implementation
//! - Run configuration (endpoints, worker counts, failure mode, date window)

pub mod cell;
pub mod config;
pub mod data;
pub mod history;
pub mod listing;
pub mod table;

pub use cell::Cell;
pub use config::{DateWindow, FailureMode, ScrapeConfig};
pub use data::{DataError, Fetcher, Universe};
pub use history::{parse_history, HistorySeries, Observation};
pub use listing::{parse_listing, Listing, ListingEntry};
pub use table::{extract_table, ExtractPolicy, HeaderNaming, RawTable};
