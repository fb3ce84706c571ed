//! Per-call fetch configuration.

use std::time::Duration;

use super::backoff::{BackoffPolicy, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MULTIPLIER, DEFAULT_JITTER_MAX};

/// Default per-attempt deadline (25 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// Default retry ceiling, counting the initial attempt.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 6;

/// Options for a single [`ResilientFetcher::fetch`](super::ResilientFetcher::fetch) call.
///
/// # Default Values
///
/// - `timeout`: 25 seconds per attempt
/// - `max_attempts`: 6
/// - `backoff_base`: 1.2 seconds
/// - `backoff_multiplier`: 1.8
/// - `jitter_max`: 250ms
/// - `user_agents`: `None` (built-in browser pool)
/// - `raise_on_failure`: `true`
/// - `referer` / `warmup_url`: `None` (the target's site root)
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Deadline for each individual attempt, including reading the body.
    pub timeout: Duration,
    /// Maximum number of attempts, including the first. Values below 1 act as 1.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub backoff_base: Duration,
    /// Growth factor applied per attempt.
    pub backoff_multiplier: f64,
    /// Exclusive upper bound of the random jitter added to every delay.
    pub jitter_max: Duration,
    /// Replacement user-agent pool.
    pub user_agents: Option<Vec<String>>,
    /// Return `Err(FetchError::Exhausted)` instead of a degraded outcome.
    pub raise_on_failure: bool,
    /// Referer header value.
    pub referer: Option<String>,
    /// Target of the best-effort request issued after block-like statuses.
    pub warmup_url: Option<String>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_max: DEFAULT_JITTER_MAX,
            user_agents: None,
            raise_on_failure: true,
            referer: None,
            warmup_url: None,
        }
    }
}

impl FetchOptions {
    /// Options with a custom attempt ceiling, defaults elsewhere.
    #[must_use]
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// Effective attempt ceiling (never below 1).
    #[must_use]
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Backoff policy derived from these options.
    #[must_use]
    pub fn backoff(&self) -> BackoffPolicy {
        BackoffPolicy::new(self.backoff_base, self.backoff_multiplier, self.jitter_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_options_defaults() {
        let options = FetchOptions::default();
        assert_eq!(options.timeout, Duration::from_secs(25));
        assert_eq!(options.max_attempts, 6);
        assert!(options.raise_on_failure);
        assert!(options.user_agents.is_none());
        assert_eq!(options.backoff(), BackoffPolicy::default());
    }

    #[test]
    fn test_attempt_limit_minimum_is_one() {
        assert_eq!(FetchOptions::with_max_attempts(0).attempt_limit(), 1);
        assert_eq!(FetchOptions::with_max_attempts(8).attempt_limit(), 8);
    }
}
