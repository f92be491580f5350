//! Fetch collaborator trait, structured error types and progress reporting.
//!
//! The [`Fetcher`] trait abstracts over the transport so the pipeline can run
//! against the real HTTP client or an in-memory page set in tests.

use std::fmt;
use thiserror::Error;

/// Structured error types for fetch and markup operations.
///
/// These are designed to be displayable in CLI contexts and cheap to clone
/// into per-entity failure reports.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("transport error for {url}: {reason}")]
    Transport { url: String, reason: String },

    #[error("markup structure error: {0}")]
    MarkupStructure(String),

    #[error("invalid table selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("config error: {0}")]
    Config(String),
}

impl DataError {
    pub fn transport(url: &str, reason: impl Into<String>) -> Self {
        DataError::Transport {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn markup(msg: impl Into<String>) -> Self {
        DataError::MarkupStructure(msg.into())
    }
}

/// Trait for page fetchers.
///
/// Implementations must tolerate concurrent calls from independent workers;
/// the caller keeps no shared state between calls.
pub trait Fetcher: Send + Sync {
    /// Human-readable name of this fetcher.
    fn name(&self) -> &str;

    /// Fetch the body of `url`. Non-success statuses are transport errors.
    fn fetch(&self, url: &str) -> Result<String, DataError>;
}

/// The two concurrent stages of the history phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Download,
    Parse,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Download => f.write_str("downloading historical pages"),
            Stage::Parse => f.write_str("parsing historical pages"),
        }
    }
}

/// Progress callback for the concurrent stages.
///
/// Purely observational: calls arrive from worker threads in completion
/// order and must not influence results.
pub trait Progress: Send + Sync {
    /// Called once before a stage starts.
    fn on_stage_start(&self, stage: Stage, total: usize);

    /// Called after each unit of work finishes, `completed` counts from 1.
    fn on_unit_complete(&self, stage: Stage, completed: usize, total: usize);

    /// Called once when the stage is done.
    fn on_stage_complete(&self, stage: Stage, succeeded: usize, failed: usize);
}

/// Progress reporter that prints to stderr (stdout may carry CSV output).
pub struct StderrProgress;

impl Progress for StderrProgress {
    fn on_stage_start(&self, stage: Stage, total: usize) {
        eprintln!("{stage}: 0/{total}");
    }

    fn on_unit_complete(&self, stage: Stage, completed: usize, total: usize) {
        eprintln!("{stage}: {completed}/{total}");
    }

    fn on_stage_complete(&self, stage: Stage, succeeded: usize, failed: usize) {
        eprintln!("{stage}: done ({succeeded} ok, {failed} failed)");
    }
}

/// Progress reporter that discards everything.
pub struct NoProgress;

impl Progress for NoProgress {
    fn on_stage_start(&self, _stage: Stage, _total: usize) {}
    fn on_unit_complete(&self, _stage: Stage, _completed: usize, _total: usize) {}
    fn on_stage_complete(&self, _stage: Stage, _succeeded: usize, _failed: usize) {}
}
