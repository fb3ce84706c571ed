//! CLI entry point for the listing harvester.

use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use listing_harvester::fetch::FetchOptions;
use listing_harvester::runner::{RunOptions, run_all};
use listing_harvester::search::load_searches;
use tracing::{debug, info};

mod cli;

use cli::Args;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    debug!(?args, "CLI arguments parsed");

    if args.min_search_delay_ms > args.max_search_delay_ms {
        bail!(
            "--min-search-delay-ms ({}) must not exceed --max-search-delay-ms ({})",
            args.min_search_delay_ms,
            args.max_search_delay_ms
        );
    }

    let searches = load_searches(&args.config)?;
    info!(searches = searches.len(), config = %args.config.display(), "Listing harvester starting");

    let options = RunOptions {
        output_root: args.output_dir,
        report_date: args.date,
        base_url: args.base_url,
        fetch: FetchOptions {
            max_attempts: args.max_attempts,
            timeout: Duration::from_secs(args.timeout_secs),
            ..FetchOptions::default()
        },
        min_search_delay: Duration::from_millis(args.min_search_delay_ms),
        max_search_delay: Duration::from_millis(args.max_search_delay_ms),
    };

    let summary = run_all(&searches, &options).await?;

    info!(
        attempted = summary.searches_attempted,
        skipped = summary.searches_skipped,
        rows = summary.rows_written,
        path = %summary.output_path.display(),
        "Run complete"
    );

    Ok(())
}
