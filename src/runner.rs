//! Sequential batch run over saved searches.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::{debug, info, instrument, warn};

use crate::extract::extract;
use crate::fetch::{FetchOptions, ResilientFetcher};
use crate::report::{REPORT_FILE_NAME, ReportRow, daily_output_dir, write_report_csv};
use crate::scoring::passes_keyword_filter;
use crate::search::SearchDef;

/// Default site root used to resolve relative listing links.
pub const DEFAULT_BASE_URL: &str = "https://www.redfin.com";

/// Attempt ceiling used for batch fetches.
pub const DEFAULT_RUN_MAX_ATTEMPTS: u32 = 8;

/// Default bounds of the random pause before each search.
pub const DEFAULT_MIN_SEARCH_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_MAX_SEARCH_DELAY: Duration = Duration::from_millis(2500);

/// Settings for [`run_all`].
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root under which the dated report directory is created.
    pub output_root: PathBuf,
    /// Report date; `None` means today in local time.
    pub report_date: Option<NaiveDate>,
    /// Base for resolving relative listing URLs.
    pub base_url: String,
    /// Per-search fetch settings. `raise_on_failure` is always forced on.
    pub fetch: FetchOptions,
    pub min_search_delay: Duration,
    pub max_search_delay: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from("output"),
            report_date: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            fetch: FetchOptions::with_max_attempts(DEFAULT_RUN_MAX_ATTEMPTS),
            min_search_delay: DEFAULT_MIN_SEARCH_DELAY,
            max_search_delay: DEFAULT_MAX_SEARCH_DELAY,
        }
    }
}

/// What a batch run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub searches_attempted: usize,
    /// Searches whose page could not be fetched or was not a 200.
    pub searches_skipped: usize,
    pub rows_written: usize,
}

/// Runs every search with a fresh fetcher and writes the consolidated report.
///
/// # Errors
///
/// Fails only if the fetcher cannot be built or the report cannot be written.
/// Per-search fetch failures are logged and skipped.
pub async fn run_all(searches: &[SearchDef], options: &RunOptions) -> Result<RunSummary> {
    let fetcher = ResilientFetcher::new().context("Failed to build HTTP fetcher")?;
    run_with_fetcher(&fetcher, searches, options).await
}

/// Like [`run_all`], with a caller-supplied fetcher.
///
/// # Errors
///
/// Fails only if the report cannot be written.
#[instrument(skip_all, fields(searches = searches.len()))]
pub async fn run_with_fetcher(
    fetcher: &ResilientFetcher,
    searches: &[SearchDef],
    options: &RunOptions,
) -> Result<RunSummary> {
    let fetch_options = FetchOptions {
        raise_on_failure: true,
        ..options.fetch.clone()
    };
    let date = options
        .report_date
        .unwrap_or_else(|| Local::now().date_naive());
    let output_path = daily_output_dir(&options.output_root, date).join(REPORT_FILE_NAME);

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for search in searches {
        info!(
            search_id = search.search_id,
            category = %search.category,
            city = %search.city,
            "starting search"
        );
        tokio::time::sleep(search_pause(options.min_search_delay, options.max_search_delay)).await;

        let outcome = match fetcher.fetch(&search.url, &fetch_options).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(search_id = search.search_id, error = %error, "fetch failed, skipping search");
                skipped += 1;
                continue;
            }
        };
        info!(
            search_id = search.search_id,
            status = outcome.status,
            elapsed_ms = outcome.elapsed.as_millis(),
            "fetched search page"
        );
        if !outcome.is_success() {
            warn!(search_id = search.search_id, status = outcome.status, "non-200 response, skipping search");
            skipped += 1;
            continue;
        }

        let extraction = extract(&outcome.body, &options.base_url);
        let before = rows.len();
        rows.extend(
            extraction
                .listings
                .iter()
                .filter(|listing| passes_keyword_filter(search, listing))
                .map(|listing| ReportRow::new(search, listing)),
        );
        info!(
            search_id = search.search_id,
            parsed = extraction.listings.len(),
            kept = rows.len() - before,
            strategy = ?extraction.diagnostics.strategy,
            json_candidates = extraction.diagnostics.json_candidates,
            "extracted listings"
        );
    }

    write_report_csv(&rows, &output_path)?;
    info!(rows = rows.len(), path = %output_path.display(), "wrote report");

    Ok(RunSummary {
        output_path,
        searches_attempted: searches.len(),
        searches_skipped: skipped,
        rows_written: rows.len(),
    })
}

/// Uniform pause in `[min, max]`; `min` when the range is empty.
fn search_pause(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    let millis = rand::thread_rng().gen_range(min.as_millis()..=max.as_millis());
    let pause = Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX));
    debug!(pause_ms = pause.as_millis(), "pausing before search");
    pause
}
