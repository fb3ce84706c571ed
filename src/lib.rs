//! Listing Harvester Library
//!
//! Fetches real-estate search-result pages and extracts structured listing
//! records from whatever the page carries: embedded JSON, or failing that,
//! visible listing cards.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - Resilient HTTP fetching with backoff, UA rotation and warm-up
//! - [`extract`] - Layered listing extraction (JSON first, HTML fallback)
//! - [`listing`] - The extracted listing record
//! - [`lookup`] - Parcel and location-value lookup tables
//! - [`search`] - Saved search definitions
//! - [`scoring`] - Keyword filter and deal score
//! - [`report`] - Consolidated CSV report
//! - [`runner`] - Sequential batch run tying the above together

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod extract;
pub mod fetch;
pub mod listing;
pub mod lookup;
pub mod report;
pub mod runner;
pub mod scoring;
pub mod search;
mod user_agent;

// Re-export commonly used types
pub use extract::{Diagnostics, Extraction, Strategy, extract, parse_price};
pub use fetch::{BackoffPolicy, FetchError, FetchOptions, FetchOutcome, ResilientFetcher};
pub use listing::Listing;
pub use runner::{RunOptions, RunSummary, run_all};
pub use search::{SearchDef, load_searches};
pub use user_agent::DEFAULT_USER_AGENTS;
