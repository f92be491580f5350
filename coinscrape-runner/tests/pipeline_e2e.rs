//! End-to-end pipeline tests over an in-memory fetcher.
//!
//! History pages are served with per-URL delays that make later entities
//! finish first, so the merged order can only come from universe order.

use chrono::NaiveDate;
use coinscrape_core::cell::Cell;
use coinscrape_core::config::{DateWindow, FailureMode, ScrapeConfig};
use coinscrape_core::data::provider::{DataError, Fetcher, Progress, Stage};
use coinscrape_runner::pipeline::{Pipeline, PipelineError, RunRequest};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

fn core_fixture(name: &str) -> String {
    // The saved pages live in coinscrape-core's test directory
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("coinscrape-core/tests/fixtures")
        .join(name);
    std::fs::read_to_string(path).unwrap()
}

fn history_page(rows: &[(&str, f64)]) -> String {
    let body: String = rows
        .iter()
        .map(|(date, close)| {
            format!(
                r#"<tr><td>{date}</td><td data-format-value="{close}">{close}</td></tr>"#
            )
        })
        .collect();
    format!(
        r#"<div id="historical-data"><table>
        <thead><tr><th>Date</th><th>Close**</th></tr></thead>
        <tbody>{body}</tbody></table></div>"#
    )
}

/// Serves canned pages, sleeping per URL before answering.
struct DelayedFetcher {
    pages: HashMap<String, (Duration, String)>,
    requested: Mutex<Vec<String>>,
    completed: Mutex<Vec<String>>,
}

impl DelayedFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requested: Mutex::new(Vec::new()),
            completed: Mutex::new(Vec::new()),
        }
    }

    fn page(mut self, url: &str, delay_ms: u64, body: String) -> Self {
        self.pages
            .insert(url.to_string(), (Duration::from_millis(delay_ms), body));
        self
    }

    fn requested(&self) -> Vec<String> {
        let mut urls = self.requested.lock().unwrap().clone();
        urls.sort();
        urls
    }
}

impl Fetcher for DelayedFetcher {
    fn name(&self) -> &str {
        "delayed"
    }

    fn fetch(&self, url: &str) -> Result<String, DataError> {
        self.requested.lock().unwrap().push(url.to_string());
        let (delay, body) = self
            .pages
            .get(url)
            .ok_or_else(|| DataError::transport(url, "HTTP 404 Not Found"))?;
        std::thread::sleep(*delay);
        self.completed.lock().unwrap().push(url.to_string());
        Ok(body.clone())
    }
}

#[derive(Default)]
struct CountingProgress {
    started: AtomicUsize,
    units: AtomicUsize,
    finished: Mutex<Vec<(Stage, usize, usize)>>,
}

impl Progress for CountingProgress {
    fn on_stage_start(&self, _stage: Stage, _total: usize) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn on_unit_complete(&self, _stage: Stage, _completed: usize, _total: usize) {
        self.units.fetch_add(1, Ordering::SeqCst);
    }

    fn on_stage_complete(&self, stage: Stage, succeeded: usize, failed: usize) {
        self.finished.lock().unwrap().push((stage, succeeded, failed));
    }
}

const BTC_URL: &str = "mem://bitcoin/20240102/20240103";
const ETH_URL: &str = "mem://ethereum/20240102/20240103";
const USDT_URL: &str = "mem://tether/20240102/20240103";

fn config() -> ScrapeConfig {
    ScrapeConfig {
        listing_url: "mem://listing".into(),
        history_url_template: "mem://{slug}/{start}/{end}".into(),
        fetch_workers: 8,
        parse_workers: 3,
        ..ScrapeConfig::default()
    }
}

fn request(symbols: Option<&[&str]>) -> RunRequest {
    RunRequest {
        window: DateWindow::new(
            NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
        )
        .unwrap(),
        symbols: symbols.map(|s| s.iter().map(|x| x.to_string()).collect()),
    }
}

/// Bitcoin is slowest, tether fastest.
fn market() -> DelayedFetcher {
    DelayedFetcher::new()
        .page("mem://listing", 0, core_fixture("listing.html"))
        .page(BTC_URL, 120, core_fixture("history_bitcoin.html"))
        .page(
            ETH_URL,
            60,
            history_page(&[("Jan 03, 2024", 2210.5), ("Jan 02, 2024", 2356.1)]),
        )
        .page(
            USDT_URL,
            0,
            history_page(&[("Jan 03, 2024", 1.0), ("Jan 02, 2024", 0.9998)]),
        )
}

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

#[test]
fn merged_order_follows_listing_not_completion() {
    let fetcher = market();
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap();

    let completed = fetcher.completed.lock().unwrap().clone();
    assert_eq!(completed.last().map(String::as_str), Some(BTC_URL));

    assert_eq!(
        out.dataset.group_order(),
        vec!["bitcoin", "ethereum", "tether"]
    );
    assert_eq!(out.dataset.len(), 6);
    assert_eq!(out.summary.selected, 3);
    assert_eq!(out.summary.merged_entities, 3);
}

#[test]
fn symbol_filter_fetches_only_selected_history() {
    let fetcher = market();
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg)
        .run(&request(Some(&["BTC"])))
        .unwrap();

    assert_eq!(
        fetcher.requested(),
        vec![BTC_URL.to_string(), "mem://listing".to_string()]
    );
    assert_eq!(out.dataset.group_order(), vec!["bitcoin"]);
    assert!(out.dataset.rows.iter().all(|r| r.symbol == "BTC"));
}

#[test]
fn unknown_filter_symbols_are_dropped() {
    let fetcher = market();
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg)
        .run(&request(Some(&["DOGE", "USDT"])))
        .unwrap();
    assert_eq!(out.dataset.group_order(), vec!["tether"]);
    assert_eq!(out.summary.listed, 3);
    assert_eq!(out.summary.selected, 1);
}

#[test]
fn descending_page_order_is_kept() {
    let fetcher = market();
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg)
        .run(&request(Some(&["BTC"])))
        .unwrap();

    let dates: Vec<NaiveDate> = out.dataset.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(2024, 1, 3), d(2024, 1, 2)]);
}

#[test]
fn heterogeneous_columns_are_unioned() {
    let fetcher = market();
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap();

    assert_eq!(
        out.dataset.columns,
        vec!["open*", "high", "low", "close**", "volume", "marketcap"]
    );
    // Ethereum pages only carry a close column
    let eth_row = out
        .dataset
        .rows
        .iter()
        .position(|r| r.slug == "ethereum")
        .unwrap();
    assert_eq!(out.dataset.value(eth_row, "close**"), Some(&Cell::Number(2210.5)));
    assert_eq!(out.dataset.value(eth_row, "open*"), Some(&Cell::Missing));
}

#[test]
fn empty_history_page_contributes_no_rows() {
    let fetcher = market().page(ETH_URL, 0, core_fixture("history_empty.html"));
    let cfg = config();
    let out = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap();

    assert_eq!(out.dataset.group_order(), vec!["bitcoin", "tether"]);
    assert_eq!(out.summary.merged_entities, 3);
    assert!(out.summary.all_succeeded());
}

#[test]
fn listing_numeric_attributes_override_text() {
    let listing = r#"<table><thead><tr><th>#</th><th id="th-name">Name</th>
        <th id="th-symbol">Symbol</th><th id="th-price">Price</th></tr></thead><tbody>
        <tr id="id-bitcoin"><td>1</td><td><a>Bitcoin</a></td><td>BTC</td>
          <td><a data-usd="1234.5">$1,234.50</a></td></tr>
        <tr id="id-ethereum"><td>2</td><td><a>Ethereum</a></td><td>ETH</td>
          <td><a data-usd="not-a-number">$2,000.00</a></td></tr>
        </tbody></table>"#;
    let fetcher = DelayedFetcher::new().page("mem://listing", 0, listing.to_string());
    let cfg = config();

    let parsed = Pipeline::new(&fetcher, &cfg).fetch_listing().unwrap();
    assert_eq!(parsed.metric_columns, vec!["price"]);
    assert_eq!(parsed.entries[0].metrics[0], Cell::Number(1234.5));
    assert_eq!(parsed.entries[1].metrics[0], Cell::Missing);
}

#[test]
fn fail_fast_reports_first_failure_in_listing_order() {
    // Tether's page is missing and fails first; ethereum's is broken markup
    let fetcher = DelayedFetcher::new()
        .page("mem://listing", 0, core_fixture("listing.html"))
        .page(BTC_URL, 0, core_fixture("history_bitcoin.html"))
        .page(ETH_URL, 50, "<html><body>maintenance</body></html>".to_string());
    let cfg = config();

    let err = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap_err();
    match err {
        PipelineError::Entity { slug, stage, source } => {
            assert_eq!(slug, "tether");
            assert_eq!(stage, Stage::Download);
            assert!(matches!(source, DataError::Transport { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn fail_fast_on_markup_error_in_parse_stage() {
    let fetcher = market().page(ETH_URL, 0, "<html><body>maintenance</body></html>".to_string());
    let cfg = config();

    let err = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap_err();
    match err {
        PipelineError::Entity { slug, stage, source } => {
            assert_eq!(slug, "ethereum");
            assert_eq!(stage, Stage::Parse);
            assert!(matches!(source, DataError::MarkupStructure(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn best_effort_collects_failures_from_both_stages() {
    let fetcher = DelayedFetcher::new()
        .page("mem://listing", 0, core_fixture("listing.html"))
        .page(BTC_URL, 30, core_fixture("history_bitcoin.html"))
        .page(ETH_URL, 0, "<p>maintenance</p>".to_string());
    let cfg = ScrapeConfig {
        failure_mode: FailureMode::BestEffort,
        ..config()
    };
    let progress = CountingProgress::default();

    let out = Pipeline::new(&fetcher, &cfg)
        .with_progress(&progress)
        .run(&request(None))
        .unwrap();

    assert_eq!(out.dataset.group_order(), vec!["bitcoin"]);
    let failed: Vec<(&str, Stage)> = out
        .summary
        .failures
        .iter()
        .map(|f| (f.slug.as_str(), f.stage))
        .collect();
    assert_eq!(
        failed,
        vec![("tether", Stage::Download), ("ethereum", Stage::Parse)]
    );
    assert!(!out.summary.all_succeeded());

    assert_eq!(progress.started.load(Ordering::SeqCst), 2);
    // three downloads plus two parses
    assert_eq!(progress.units.load(Ordering::SeqCst), 5);
    assert_eq!(
        *progress.finished.lock().unwrap(),
        vec![(Stage::Download, 2, 1), (Stage::Parse, 1, 1)]
    );
}

#[test]
fn repeated_runs_are_identical() {
    let cfg = config();
    let a = Pipeline::new(&market(), &cfg).run(&request(None)).unwrap();
    let b = Pipeline::new(&market(), &cfg).run(&request(None)).unwrap();
    assert_eq!(a.dataset, b.dataset);
}

#[test]
fn listing_phase_failure_is_fatal() {
    let fetcher = DelayedFetcher::new().page("mem://listing", 0, "<p>no table</p>".to_string());
    let cfg = config();
    let err = Pipeline::new(&fetcher, &cfg).run(&request(None)).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Listing(DataError::MarkupStructure(_))
    ));
    assert_eq!(fetcher.requested(), vec!["mem://listing".to_string()]);
}

#[test]
fn fail_fast_progress_counts_whole_stage() {
    let listing = r#"<table><thead><tr><th>#</th><th id="th-name">Name</th>
        <th id="th-symbol">Symbol</th></tr></thead><tbody>
        <tr id="id-bitcoin"><td>1</td><td><a>Bitcoin</a></td><td>BTC</td></tr>
        <tr id="id-ethereum"><td>2</td><td><a>Ethereum</a></td><td>ETH</td></tr>
        <tr id="id-tether"><td>3</td><td><a>Tether</a></td><td>USDT</td></tr>
        <tr id="id-solana"><td>4</td><td><a>Solana</a></td><td>SOL</td></tr>
        </tbody></table>"#;
    let page = || history_page(&[("Jan 03, 2024", 1.0)]);
    // Bitcoin's page is missing; the other three download fine
    let fetcher = DelayedFetcher::new()
        .page("mem://listing", 0, listing.to_string())
        .page(ETH_URL, 0, page())
        .page(USDT_URL, 0, page())
        .page("mem://solana/20240102/20240103", 0, page());
    let cfg = config();
    let progress = CountingProgress::default();

    let err = Pipeline::new(&fetcher, &cfg)
        .with_progress(&progress)
        .run(&request(None))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Entity { ref slug, .. } if slug == "bitcoin"));
    assert_eq!(
        *progress.finished.lock().unwrap(),
        vec![(Stage::Download, 3, 1)]
    );
}
