//! Fetch pipeline: listing → universe → download stage → parse stage → merge.
//!
//! Phases run strictly in sequence. The two history stages each run on their
//! own bounded pool: a wide one for network-bound downloads and a
//! core-count one for parsing. Neither stage retries.
//!
//! Failure handling follows [`FailureMode`]:
//! - `FailFast` (default): the first failing entity, in universe order,
//!   aborts the run once its stage has finished
//! - `BestEffort`: failing entities are left out of the merge and listed
//!   in [`RunSummary::failures`]

use thiserror::Error;
use tracing::{debug, info, warn};

use coinscrape_core::config::{DateWindow, FailureMode, ScrapeConfig};
use coinscrape_core::data::provider::{DataError, Fetcher, NoProgress, Progress, Stage};
use coinscrape_core::data::urls::{history_url, listing_url};
use coinscrape_core::data::Universe;
use coinscrape_core::history::{parse_history, HistorySeries};
use coinscrape_core::listing::{parse_listing, Listing};

use crate::merge::{merge_series, EntitySeries, MergedDataset};
use crate::pool::WorkerPool;

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[source] DataError),

    #[error("listing phase failed: {0}")]
    Listing(#[source] DataError),

    #[error("{stage} failed for '{slug}': {source}")]
    Entity {
        slug: String,
        stage: Stage,
        #[source]
        source: DataError,
    },

    #[error("failed to build {name} worker pool: {reason}")]
    Pool { name: &'static str, reason: String },
}

/// What one run should fetch.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub window: DateWindow,
    /// Restrict the universe to these symbols. `None` means everything.
    pub symbols: Option<Vec<String>>,
}

/// One entity left out of the merge in best-effort mode.
#[derive(Debug, Clone)]
pub struct EntityFailure {
    pub slug: String,
    pub symbol: String,
    pub stage: Stage,
    pub error: DataError,
}

/// Counts and failures of a finished run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub listed: usize,
    pub selected: usize,
    pub merged_entities: usize,
    pub rows: usize,
    pub failures: Vec<EntityFailure>,
}

impl RunSummary {
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub dataset: MergedDataset,
    pub summary: RunSummary,
}

pub struct Pipeline<'a> {
    fetcher: &'a dyn Fetcher,
    config: &'a ScrapeConfig,
    progress: &'a dyn Progress,
}

impl<'a> Pipeline<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, config: &'a ScrapeConfig) -> Self {
        Self {
            fetcher,
            config,
            progress: &NoProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Listing phase: one sequential fetch and parse. Any failure is fatal.
    pub fn fetch_listing(&self) -> Result<Listing, PipelineError> {
        let url = listing_url(self.config);
        info!(fetcher = self.fetcher.name(), %url, "fetching listing");
        let body = self.fetcher.fetch(&url).map_err(PipelineError::Listing)?;
        let listing = parse_listing(&body).map_err(PipelineError::Listing)?;
        info!(entities = listing.len(), "listing parsed");
        Ok(listing)
    }

    /// History URLs in universe order.
    pub fn history_urls(&self, universe: &Universe, window: &DateWindow) -> Vec<String> {
        universe
            .entries()
            .iter()
            .map(|e| history_url(&self.config.history_url_template, &e.slug, window))
            .collect()
    }

    /// Run all phases and return the merged dataset.
    pub fn run(&self, request: &RunRequest) -> Result<RunOutput, PipelineError> {
        self.config.validate().map_err(PipelineError::Config)?;

        let listing = self.fetch_listing()?;
        let universe = Universe::select(&listing, request.symbols.as_deref());
        info!(
            listed = listing.len(),
            selected = universe.len(),
            start = %request.window.start,
            end = %request.window.end,
            "universe selected"
        );

        let urls = self.history_urls(&universe, &request.window);
        let mut failures = Vec::new();

        let fetch_pool = WorkerPool::new("fetch", self.config.fetch_workers)?;
        let parse_pool = WorkerPool::new("parse", self.config.parse_workers)?;

        // Stage A: downloads
        let total = urls.len();
        info!(pages = total, workers = fetch_pool.threads(), "download stage");
        self.progress.on_stage_start(Stage::Download, total);
        let fetched = fetch_pool.map(
            &urls,
            |url| {
                debug!(%url, "fetching history page");
                self.fetcher.fetch(url)
            },
            |done| self.progress.on_unit_complete(Stage::Download, done, total),
        );
        let bodies = self.settle(
            Stage::Download,
            &universe,
            fetched.into_iter().enumerate(),
            &mut failures,
        )?;

        // Stage B: parsing
        let total = bodies.len();
        info!(pages = total, workers = parse_pool.threads(), "parse stage");
        self.progress.on_stage_start(Stage::Parse, total);
        let parsed: Vec<Result<HistorySeries, DataError>> = parse_pool.map(
            &bodies,
            |(_, body)| parse_history(body),
            |done| self.progress.on_unit_complete(Stage::Parse, done, total),
        );
        let indices: Vec<usize> = bodies.iter().map(|(i, _)| *i).collect();
        drop(bodies);
        let series = self.settle(
            Stage::Parse,
            &universe,
            indices.into_iter().zip(parsed),
            &mut failures,
        )?;

        let merged_entities = series.len();
        let dataset = merge_series(series.into_iter().map(|(i, series)| {
            let entry = &universe.entries()[i];
            EntitySeries {
                slug: entry.slug.clone(),
                symbol: entry.symbol.clone(),
                series,
            }
        }));
        info!(
            entities = merged_entities,
            rows = dataset.len(),
            failed = failures.len(),
            "merge complete"
        );

        let summary = RunSummary {
            listed: listing.len(),
            selected: universe.len(),
            merged_entities,
            rows: dataset.len(),
            failures,
        };
        Ok(RunOutput { dataset, summary })
    }

    /// Split a stage's results by universe index into survivors and failures.
    ///
    /// Progress sees the stage's full success and failure counts in both
    /// modes. In fail-fast mode the first failure in universe order is then
    /// returned as the run error.
    fn settle<T, I>(
        &self,
        stage: Stage,
        universe: &Universe,
        results: I,
        failures: &mut Vec<EntityFailure>,
    ) -> Result<Vec<(usize, T)>, PipelineError>
    where
        I: IntoIterator<Item = (usize, Result<T, DataError>)>,
    {
        let mut ok = Vec::new();
        let mut first_error: Option<PipelineError> = None;
        let mut failed = 0;
        for (i, result) in results {
            let entry = &universe.entries()[i];
            match result {
                Ok(value) => ok.push((i, value)),
                Err(error) => {
                    failed += 1;
                    match self.config.failure_mode {
                        FailureMode::FailFast => {
                            if first_error.is_none() {
                                first_error = Some(PipelineError::Entity {
                                    slug: entry.slug.clone(),
                                    stage,
                                    source: error,
                                });
                            }
                        }
                        FailureMode::BestEffort => {
                            warn!(slug = %entry.slug, %stage, %error, "skipping entity");
                            failures.push(EntityFailure {
                                slug: entry.slug.clone(),
                                symbol: entry.symbol.clone(),
                                stage,
                                error,
                            });
                        }
                    }
                }
            }
        }
        self.progress.on_stage_complete(stage, ok.len(), failed);
        match first_error {
            Some(err) => Err(err),
            None => Ok(ok),
        }
    }
}
