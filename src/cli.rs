//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use listing_harvester::runner::{DEFAULT_BASE_URL, DEFAULT_RUN_MAX_ATTEMPTS};

/// Run saved real-estate searches and write a scored listing report.
///
/// Each search page is fetched with retries, listings are extracted from
/// embedded JSON (or visible cards as a fallback), filtered, scored, and
/// written to `<output-dir>/YYYY/MM/DD/all_listings.csv`.
#[derive(Parser, Debug)]
#[command(name = "listing-harvester")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// JSON file with the saved searches
    #[arg(long, default_value = "config/searches.json")]
    pub config: PathBuf,

    /// Root directory for dated reports
    #[arg(short = 'o', long, default_value = "output")]
    pub output_dir: PathBuf,

    /// Report date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Maximum fetch attempts per search page (1-20)
    #[arg(short = 'r', long, default_value_t = DEFAULT_RUN_MAX_ATTEMPTS, value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_attempts: u32,

    /// Per-attempt request timeout in seconds (1-300)
    #[arg(long, default_value_t = 25, value_parser = clap::value_parser!(u64).range(1..=300))]
    pub timeout_secs: u64,

    /// Site root used to resolve relative listing links
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Minimum random pause before each search in milliseconds
    #[arg(long, default_value_t = 800, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub min_search_delay_ms: u64,

    /// Maximum random pause before each search in milliseconds
    #[arg(long, default_value_t = 2500, value_parser = clap::value_parser!(u64).range(0..=60000))]
    pub max_search_delay_ms: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default_args_parses_successfully() {
        let args = Args::try_parse_from(["listing-harvester"]).unwrap();
        assert_eq!(args.verbose, 0);
        assert!(!args.quiet);
        assert_eq!(args.config, PathBuf::from("config/searches.json"));
        assert_eq!(args.output_dir, PathBuf::from("output"));
        assert_eq!(args.date, None);
        assert_eq!(args.max_attempts, 8);
        assert_eq!(args.timeout_secs, 25);
        assert_eq!(args.base_url, "https://www.redfin.com");
        assert_eq!(args.min_search_delay_ms, 800);
        assert_eq!(args.max_search_delay_ms, 2500);
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["listing-harvester", "-v"]).unwrap();
        assert_eq!(args.verbose, 1);

        let args = Args::try_parse_from(["listing-harvester", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["listing-harvester", "--quiet"]).unwrap();
        assert!(args.quiet);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["listing-harvester", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["listing-harvester", "--invalid-flag"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_paths_and_date() {
        let args = Args::try_parse_from([
            "listing-harvester",
            "--config",
            "/tmp/searches.json",
            "-o",
            "/tmp/out",
            "--date",
            "2024-03-07",
        ])
        .unwrap();
        assert_eq!(args.config, PathBuf::from("/tmp/searches.json"));
        assert_eq!(args.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(args.date, NaiveDate::from_ymd_opt(2024, 3, 7));
    }

    #[test]
    fn test_cli_invalid_date_rejected() {
        assert!(Args::try_parse_from(["listing-harvester", "--date", "March 7"]).is_err());
    }

    #[test]
    fn test_cli_max_attempts_range() {
        let args = Args::try_parse_from(["listing-harvester", "-r", "20"]).unwrap();
        assert_eq!(args.max_attempts, 20);

        let err = Args::try_parse_from(["listing-harvester", "-r", "0"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        assert!(Args::try_parse_from(["listing-harvester", "-r", "21"]).is_err());
    }

    #[test]
    fn test_cli_timeout_range() {
        let args = Args::try_parse_from(["listing-harvester", "--timeout-secs", "300"]).unwrap();
        assert_eq!(args.timeout_secs, 300);
        assert!(Args::try_parse_from(["listing-harvester", "--timeout-secs", "0"]).is_err());
    }

    #[test]
    fn test_cli_search_delay_flags() {
        let args = Args::try_parse_from([
            "listing-harvester",
            "--min-search-delay-ms",
            "0",
            "--max-search-delay-ms",
            "10",
        ])
        .unwrap();
        assert_eq!(args.min_search_delay_ms, 0);
        assert_eq!(args.max_search_delay_ms, 10);
    }
}
