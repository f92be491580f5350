//! Fetching, URL building and universe selection.

pub mod http;
pub mod provider;
pub mod universe;
pub mod urls;

pub use http::HttpFetcher;
pub use provider::{DataError, Fetcher, NoProgress, Progress, Stage, StderrProgress};
pub use universe::Universe;
pub use urls::{compact_date, history_url, listing_url};
