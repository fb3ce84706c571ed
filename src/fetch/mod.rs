//! Resilient page fetching for search-result URLs.
//!
//! Listing sites rate-limit and block scripted clients, so a single GET is not
//! enough. [`ResilientFetcher`] retries with geometric backoff, rotates browser
//! user-agents, and issues a warm-up request to the site root after block-like
//! statuses so the session picks up fresh cookies.
//!
//! # Features
//!
//! - Retry on 403/405/429/500/502/503/504 and network failures
//! - Backoff `base * multiplier^(n-1)` plus jitter (see [`BackoffPolicy`])
//! - Browser header set with a rotating user-agent pool
//! - Raise-or-degrade on exhaustion via [`FetchOptions::raise_on_failure`]
//!
//! # Example
//!
//! ```no_run
//! use listing_harvester::fetch::{FetchOptions, ResilientFetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = ResilientFetcher::new()?;
//! let options = FetchOptions {
//!     raise_on_failure: false,
//!     ..FetchOptions::default()
//! };
//! let outcome = fetcher.fetch("https://www.redfin.com/city/1/WA/Seattle", &options).await?;
//! if let Some(error) = &outcome.error {
//!     eprintln!("degraded: {error}");
//! }
//! # Ok(())
//! # }
//! ```

mod backoff;
mod client;
mod error;
mod options;
mod outcome;

pub use backoff::{BackoffPolicy, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_JITTER_MAX};
pub use client::{ResilientFetcher, StatusClass, classify_status};
pub use error::FetchError;
pub use options::{DEFAULT_MAX_ATTEMPTS, DEFAULT_TIMEOUT, FetchOptions};
pub use outcome::FetchOutcome;
