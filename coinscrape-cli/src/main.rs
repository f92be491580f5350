//! coinscrape CLI: listing snapshot and merged historical data.
//!
//! Commands:
//! - `history`: fetch the listing, then every selected asset's history
//!   page, and write one merged CSV
//! - `listing`: fetch and write the listing snapshot only
//!
//! Logs go to stderr (`RUST_LOG`, default `info`); CSV goes to `--output`
//! or stdout.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use coinscrape_core::config::{DateWindow, FailureMode, ScrapeConfig};
use coinscrape_core::data::{HttpFetcher, StderrProgress};
use coinscrape_runner::export::{save_dataset, save_listing, write_dataset_csv, write_listing_csv};
use coinscrape_runner::pipeline::{Pipeline, RunRequest};

#[derive(Parser)]
#[command(
    name = "coinscrape",
    about = "Scrape cryptocurrency listing and historical market data into CSV"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download historical data for every listed asset and merge it.
    History {
        /// Output CSV path. Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// First day, inclusive (YYYY-MM-DD). Defaults to 2013-04-28.
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last day, inclusive (YYYY-MM-DD). Defaults to today.
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Only these symbols (e.g. BTC,ETH). Defaults to the whole listing.
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        symbols: Option<Vec<String>>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Download worker count.
        #[arg(long)]
        fetch_workers: Option<usize>,

        /// Parse worker count (0 = one per core).
        #[arg(long)]
        parse_workers: Option<usize>,

        /// Skip assets whose page fails instead of aborting the run.
        #[arg(long, default_value_t = false)]
        best_effort: bool,
    },
    /// Download the listing page and write its snapshot.
    Listing {
        /// Output CSV path. Defaults to stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD, got '{s}': {e}"))
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::History {
            output,
            start,
            end,
            symbols,
            config,
            fetch_workers,
            parse_workers,
            best_effort,
        } => {
            let window = resolve_window(start, end);
            let mut cfg = load_config(config.as_deref())?;
            if let Some(n) = fetch_workers {
                cfg.fetch_workers = n;
            }
            if let Some(n) = parse_workers {
                cfg.parse_workers = n;
            }
            if best_effort {
                cfg.failure_mode = FailureMode::BestEffort;
            }
            run_history(&cfg, window, symbols, output.as_deref())
        }
        Commands::Listing { output, config } => {
            let cfg = load_config(config.as_deref())?;
            run_listing(&cfg, output.as_deref())
        }
    }
}

/// Apply the date defaults. A reversed window is a usage error and exits
/// before anything touches the network.
fn resolve_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> DateWindow {
    let start = start.unwrap_or_else(DateWindow::default_start);
    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
    match DateWindow::new(start, end) {
        Ok(window) => window,
        Err(_) => Cli::command()
            .error(
                ErrorKind::ArgumentConflict,
                format!("--start ({start}) is after --end ({end})"),
            )
            .exit(),
    }
}

fn load_config(path: Option<&Path>) -> Result<ScrapeConfig> {
    let cfg = match path {
        Some(p) => ScrapeConfig::from_file(p)
            .with_context(|| format!("failed to load config {}", p.display()))?,
        None => ScrapeConfig::default(),
    };
    Ok(cfg)
}

fn run_history(
    cfg: &ScrapeConfig,
    window: DateWindow,
    symbols: Option<Vec<String>>,
    output: Option<&Path>,
) -> Result<()> {
    cfg.validate()?;
    let fetcher = HttpFetcher::new(cfg)?;
    let progress = StderrProgress;

    let out = Pipeline::new(&fetcher, cfg)
        .with_progress(&progress)
        .run(&RunRequest { window, symbols })?;

    for failure in &out.summary.failures {
        eprintln!(
            "Skipped {} ({}) during {}: {}",
            failure.slug, failure.symbol, failure.stage, failure.error
        );
    }

    match output {
        Some(path) => {
            save_dataset(&out.dataset, path)?;
            info!(path = %path.display(), rows = out.dataset.len(), "dataset written");
        }
        None => write_dataset_csv(&out.dataset, std::io::stdout().lock())?,
    }
    Ok(())
}

fn run_listing(cfg: &ScrapeConfig, output: Option<&Path>) -> Result<()> {
    cfg.validate()?;
    let fetcher = HttpFetcher::new(cfg)?;
    let listing = Pipeline::new(&fetcher, cfg).fetch_listing()?;

    match output {
        Some(path) => {
            save_listing(&listing, path)?;
            info!(path = %path.display(), entities = listing.len(), "listing written");
        }
        None => write_listing_csv(&listing, std::io::stdout().lock())?,
    }
    Ok(())
}
