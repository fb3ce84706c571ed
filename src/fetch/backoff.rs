//! Geometric backoff with bounded jitter between fetch attempts.
//!
//! # Delay Calculation
//!
//! ```text
//! delay(n) = base * multiplier^(n - 1) + jitter,   jitter in [0, jitter_max)
//! ```
//!
//! `n` is the 1-based number of the attempt that just failed, so the first
//! retry waits roughly `base` and later retries grow geometrically. There is no
//! delay cap: the attempt ceiling bounds the total wait.

use std::time::Duration;

use rand::Rng;

/// Default base delay for the first retry (1.2 seconds).
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(1200);

/// Default growth factor per attempt.
pub const DEFAULT_BACKOFF_MULTIPLIER: f64 = 1.8;

/// Default upper bound (exclusive) of the random jitter (250ms).
pub const DEFAULT_JITTER_MAX: Duration = Duration::from_millis(250);

/// Pure backoff computation; the caller owns the randomness and the sleeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackoffPolicy {
    base: Duration,
    multiplier: f64,
    jitter_max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: DEFAULT_BACKOFF_BASE,
            multiplier: DEFAULT_BACKOFF_MULTIPLIER,
            jitter_max: DEFAULT_JITTER_MAX,
        }
    }
}

impl BackoffPolicy {
    /// Creates a policy. Negative or non-finite multipliers are treated as 1.0.
    #[must_use]
    pub fn new(base: Duration, multiplier: f64, jitter_max: Duration) -> Self {
        let multiplier = if multiplier.is_finite() && multiplier >= 0.0 {
            multiplier
        } else {
            1.0
        };
        Self {
            base,
            multiplier,
            jitter_max,
        }
    }

    /// Base delay for the first retry.
    #[must_use]
    pub fn base(&self) -> Duration {
        self.base
    }

    /// Growth factor per attempt.
    #[must_use]
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Exclusive upper bound of the jitter.
    #[must_use]
    pub fn jitter_max(&self) -> Duration {
        self.jitter_max
    }

    /// Deterministic part of the delay for a 1-based attempt number.
    ///
    /// Attempt 0 is treated as attempt 1.
    #[must_use]
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.max(1) - 1;
        let factor = self.multiplier.powi(i32::try_from(exponent).unwrap_or(i32::MAX));
        let secs = self.base.as_secs_f64() * factor;
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    /// Full delay for a 1-based attempt number: base delay plus jitter drawn from `rng`.
    pub fn delay<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        self.base_delay(attempt).saturating_add(self.jitter(rng))
    }

    fn jitter<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max_nanos = u64::try_from(self.jitter_max.as_nanos()).unwrap_or(u64::MAX);
        if max_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rng.gen_range(0..max_nanos))
    }
}
