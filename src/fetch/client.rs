//! HTTP fetcher that survives rate limiting, transient errors and bot blocks.
//!
//! Each call runs a small state machine: attempt, classify, and either finish,
//! or warm up and back off before the next attempt. See [`classify_status`]
//! for which statuses are retried.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use reqwest::Client;
use reqwest::header::HeaderMap;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::error::{FetchError, exhaustion_message};
use super::options::FetchOptions;
use super::outcome::FetchOutcome;
use crate::user_agent;

/// How a response status drives the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// HTTP 200: done.
    Success,
    /// Back off and try again. `block_like` statuses also trigger a warm-up request.
    Retryable {
        /// The site is refusing this client rather than failing internally.
        block_like: bool,
    },
    /// Any other status: report it as-is without retrying.
    NonRetryable,
}

/// Classifies an HTTP status code for the retry loop.
///
/// | Status | Class |
/// |--------|-------|
/// | 200 | Success |
/// | 403, 405, 429 | Retryable, block-like |
/// | 500, 502, 503, 504 | Retryable |
/// | anything else | NonRetryable |
#[must_use]
pub fn classify_status(status: u16) -> StatusClass {
    match status {
        200 => StatusClass::Success,
        403 | 405 | 429 => StatusClass::Retryable { block_like: true },
        500 | 502 | 503 | 504 => StatusClass::Retryable { block_like: false },
        _ => StatusClass::NonRetryable,
    }
}

/// Fetches pages with user-agent rotation, warm-up requests and backoff.
///
/// The underlying [`reqwest::Client`] keeps a cookie store and a connection
/// pool, so one fetcher should be reused across a batch. It is safe to call
/// [`fetch`](Self::fetch) concurrently for independent URLs.
///
/// # Example
///
/// ```no_run
/// use listing_harvester::fetch::{FetchOptions, ResilientFetcher};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = ResilientFetcher::new()?;
/// let outcome = fetcher
///     .fetch("https://www.redfin.com/city/1/WA/Seattle", &FetchOptions::default())
///     .await?;
/// println!("HTTP {} in {:?}", outcome.status, outcome.elapsed);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ResilientFetcher {
    client: Client,
    rng: Mutex<StdRng>,
}

enum AttemptFailure {
    Network(reqwest::Error),
    Unsendable,
}

impl ResilientFetcher {
    /// Creates a fetcher with an entropy-seeded randomness source.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Creates a fetcher drawing user-agents and jitter from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_rng(rng: StdRng) -> Result<Self, FetchError> {
        let client = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .build()
            .map_err(FetchError::client_build)?;
        Ok(Self::with_client(client, rng))
    }

    /// Creates a fetcher over a caller-managed transport.
    #[must_use]
    pub fn with_client(client: Client, rng: StdRng) -> Self {
        Self {
            client,
            rng: Mutex::new(rng),
        }
    }

    /// Fetches `url`, retrying per `options`.
    ///
    /// Returns on the first 200, on the first non-retryable status (reported as a
    /// normal outcome), or after `options.max_attempts` attempts. On exhaustion the
    /// result depends on `options.raise_on_failure`: an error, or an outcome with
    /// `error` populated and `status` from the last response (0 if none).
    ///
    /// # Errors
    ///
    /// - [`FetchError::InvalidUrl`] if `url` cannot be requested at all
    /// - [`FetchError::Exhausted`] when attempts run out and `raise_on_failure` is set
    #[instrument(skip(self, options), fields(max_attempts = options.attempt_limit()))]
    pub async fn fetch(&self, url: &str, options: &FetchOptions) -> Result<FetchOutcome, FetchError> {
        let target = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        let site_root = site_root(&target);
        let referer = options.referer.as_deref().unwrap_or(&site_root);
        let warmup_url = options.warmup_url.as_deref().unwrap_or(&site_root);
        let pool = user_agent::resolve_pool(options.user_agents.as_deref());
        let backoff = options.backoff();
        let max_attempts = options.attempt_limit();

        let mut last_status: Option<u16> = None;
        let mut last_body = String::new();
        let mut last_elapsed = Duration::ZERO;
        let mut last_error: Option<reqwest::Error> = None;

        for attempt in 1..=max_attempts {
            let chosen = self.draw(|rng| user_agent::choose(&pool, rng).to_string());
            let headers = user_agent::browser_headers(&chosen, referer);
            debug!(attempt, max_attempts, user_agent = %chosen, "sending request");

            let started = Instant::now();
            let block_like = match self.attempt(url, headers.clone(), options.timeout).await {
                Ok((status, body)) => {
                    let elapsed = started.elapsed();
                    match classify_status(status) {
                        StatusClass::Success => {
                            info!(
                                attempt,
                                status,
                                elapsed_ms = elapsed.as_millis(),
                                bytes = body.len(),
                                "fetch succeeded"
                            );
                            return Ok(outcome(url, status, body, elapsed, None));
                        }
                        StatusClass::NonRetryable => {
                            info!(attempt, status, "non-retryable status");
                            return Ok(outcome(url, status, body, elapsed, None));
                        }
                        StatusClass::Retryable { block_like } => {
                            last_status = Some(status);
                            last_body = body;
                            last_elapsed = elapsed;
                            warn!(attempt, status, block_like, "retryable status");
                            block_like
                        }
                    }
                }
                Err(AttemptFailure::Network(error)) => {
                    warn!(attempt, timeout = error.is_timeout(), error = %error, "network failure");
                    last_elapsed = started.elapsed();
                    last_error = Some(error);
                    false
                }
                Err(AttemptFailure::Unsendable) => {
                    return Err(FetchError::invalid_url(url));
                }
            };

            if block_like {
                self.warm_up(warmup_url, headers, options.timeout).await;
            }

            let delay = self.draw(|rng| backoff.delay(attempt, rng));
            debug!(attempt, delay_ms = delay.as_millis(), "backing off");
            tokio::time::sleep(delay).await;
        }

        let message = exhaustion_message(url, max_attempts, last_status, last_error.as_ref());
        warn!(attempts = max_attempts, ?last_status, "fetch exhausted");

        if options.raise_on_failure {
            return Err(FetchError::exhausted(
                url,
                max_attempts,
                last_status,
                message,
                last_error,
            ));
        }

        Ok(outcome(
            url,
            last_status.unwrap_or(0),
            last_body,
            last_elapsed,
            Some(message),
        ))
    }

    /// Sends one GET and reads the body. Body read failures count as network failures.
    async fn attempt(
        &self,
        url: &str,
        headers: HeaderMap,
        timeout: Duration,
    ) -> Result<(u16, String), AttemptFailure> {
        let response = self
            .client
            .get(url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    AttemptFailure::Unsendable
                } else {
                    AttemptFailure::Network(e)
                }
            })?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(AttemptFailure::Network)?;
        Ok((status, body))
    }

    /// Best-effort GET to pick up session cookies. Every failure is ignored.
    async fn warm_up(&self, warmup_url: &str, headers: HeaderMap, timeout: Duration) {
        match self
            .client
            .get(warmup_url)
            .headers(headers)
            .timeout(timeout)
            .send()
            .await
        {
            Ok(response) => {
                debug!(url = %warmup_url, status = response.status().as_u16(), "warm-up done");
            }
            Err(error) => {
                debug!(url = %warmup_url, error = %error, "warm-up failed, ignoring");
            }
        }
    }

    fn draw<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

fn outcome(
    url: &str,
    status: u16,
    body: String,
    elapsed: Duration,
    error: Option<String>,
) -> FetchOutcome {
    FetchOutcome {
        url: url.to_string(),
        status,
        body,
        elapsed,
        error,
    }
}

/// The site root (`scheme://host[:port]/`) of a URL.
fn site_root(url: &Url) -> String {
    url.join("/")
        .map_or_else(|_| url.to_string(), |root| root.to_string())
}
