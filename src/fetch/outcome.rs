//! The terminal record of one fetch call.

use std::time::Duration;

/// Result of a complete fetch call (all attempts included).
///
/// Built exactly once per call: on the first 200, on the first non-retryable
/// status, or after the attempts are exhausted (degraded mode only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// The URL that was requested.
    pub url: String,
    /// HTTP status of the last response; 0 if no response was ever received.
    pub status: u16,
    /// Body text of the last response seen (empty if none).
    pub body: String,
    /// Wall time of the attempt that produced `status` and `body`.
    pub elapsed: Duration,
    /// Populated only for degraded outcomes after exhaustion.
    pub error: Option<String>,
}

impl FetchOutcome {
    /// True for a 200 response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == 200 && self.error.is_none()
    }

    /// True when the outcome was produced by exhaustion rather than a response.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
