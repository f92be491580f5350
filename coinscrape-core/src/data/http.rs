//! Blocking HTTP fetcher.
//!
//! One `reqwest::blocking::Client` is shared by every download worker; the
//! client is internally pooled and safe to call from many threads. There is
//! no retry or backoff: a failed request is reported to the caller as-is.

use super::provider::{DataError, Fetcher};
use crate::config::ScrapeConfig;
use std::time::Duration;

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> Result<Self, DataError> {
        let mut builder = reqwest::blocking::Client::builder().user_agent(&config.user_agent);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| DataError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: &str) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| DataError::transport(url, e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataError::transport(url, format!("HTTP {status}")));
        }

        resp.text()
            .map_err(|e| DataError::transport(url, format!("failed to read body: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_and_without_timeout() {
        assert!(HttpFetcher::new(&ScrapeConfig::default()).is_ok());
        let cfg = ScrapeConfig {
            timeout_secs: Some(5),
            ..ScrapeConfig::default()
        };
        let fetcher = HttpFetcher::new(&cfg).unwrap();
        assert_eq!(fetcher.name(), "http");
    }
}
