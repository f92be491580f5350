//! coinscrape runner: pipeline orchestration, series merge, CSV export.
//!
//! This crate builds on `coinscrape-core` to provide:
//! - Order-preserving bounded worker pools (one per stage)
//! - The listing → universe → download → parse → merge pipeline
//! - Fail-fast and best-effort failure handling with a run summary
//! - CSV export of the merged dataset and the listing snapshot

pub mod export;
pub mod merge;
pub mod pipeline;
pub mod pool;

pub use export::{
    export_dataset_csv, export_listing_csv, save_dataset, save_listing, write_dataset_csv,
    write_listing_csv,
};
pub use merge::{merge_series, EntitySeries, MergedDataset, MergedRow};
pub use pipeline::{EntityFailure, Pipeline, PipelineError, RunOutput, RunRequest, RunSummary};
pub use pool::WorkerPool;
