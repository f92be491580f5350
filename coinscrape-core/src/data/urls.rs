//! URL construction for listing and history pages.

use crate::config::{DateWindow, ScrapeConfig};
use chrono::NaiveDate;

/// Compact numeric calendar date used in history URLs.
pub fn compact_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

pub fn listing_url(config: &ScrapeConfig) -> String {
    config.listing_url.clone()
}

/// Fill the history template for one entity.
pub fn history_url(template: &str, slug: &str, window: &DateWindow) -> String {
    template
        .replace("{slug}", slug)
        .replace("{start}", &compact_date(window.start))
        .replace("{end}", &compact_date(window.end))
}
