//! Run configuration: endpoints, worker counts, failure mode and date window.
//!
//! Stored as TOML. Every field has a default so an empty file (or no file at
//! all) yields a working configuration.

use crate::data::provider::DataError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Earliest date the upstream history pages carry data for.
pub const DEFAULT_START: (i32, u32, u32) = (2013, 4, 28);

pub const DEFAULT_LISTING_URL: &str = "https://coinmarketcap.com/all/views/all/";
pub const DEFAULT_HISTORY_URL_TEMPLATE: &str =
    "https://coinmarketcap.com/currencies/{slug}/historical-data/?start={start}&end={end}";

/// What to do when a single entity fails during the history phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Abort the whole run on the first per-entity failure.
    #[default]
    FailFast,
    /// Skip failed entities and report them in the run summary.
    BestEffort,
}

/// Inclusive calendar date range for history pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DataError> {
        if start > end {
            return Err(DataError::Config(format!(
                "start date {start} is after end date {end}"
            )));
        }
        Ok(Self { start, end })
    }

    pub fn default_start() -> NaiveDate {
        let (y, m, d) = DEFAULT_START;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }

    /// Window from the default start through `today`.
    pub fn through(today: NaiveDate) -> Self {
        Self {
            start: Self::default_start(),
            end: today,
        }
    }
}

/// Serializable scrape configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Fixed, parameterless listing endpoint.
    pub listing_url: String,

    /// History endpoint with `{slug}`, `{start}` and `{end}` placeholders.
    pub history_url_template: String,

    pub user_agent: String,

    /// Per-request timeout. `None` keeps the transport default.
    pub timeout_secs: Option<u64>,

    /// Worker count for the I/O-bound download stage.
    pub fetch_workers: usize,

    /// Worker count for the CPU-bound parse stage. 0 means one per core.
    pub parse_workers: usize,

    pub failure_mode: FailureMode,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            history_url_template: DEFAULT_HISTORY_URL_TEMPLATE.to_string(),
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) coinscrape/0.1".to_string(),
            timeout_secs: None,
            fetch_workers: 32,
            parse_workers: 0,
            failure_mode: FailureMode::FailFast,
        }
    }
}

impl ScrapeConfig {
    /// Load a configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, DataError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DataError::Config(format!("read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, DataError> {
        let config: Self =
            toml::from_str(content).map_err(|e| DataError::Config(format!("parse TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, DataError> {
        toml::to_string_pretty(self).map_err(|e| DataError::Config(format!("serialize: {e}")))
    }

    pub fn validate(&self) -> Result<(), DataError> {
        if self.fetch_workers == 0 {
            return Err(DataError::Config("fetch_workers must be at least 1".into()));
        }
        if !self.history_url_template.contains("{slug}") {
            return Err(DataError::Config(
                "history_url_template must contain {slug}".into(),
            ));
        }
        Ok(())
    }
}
