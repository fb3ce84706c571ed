//! Error types for the fetch module.

use thiserror::Error;

/// Errors returned by [`ResilientFetcher`](super::ResilientFetcher).
///
/// Non-200 responses are not errors: they come back as a
/// [`FetchOutcome`](super::FetchOutcome) and the caller checks the status.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The target URL could not be parsed; no request was sent.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// The HTTP transport could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        /// The underlying builder error.
        #[source]
        source: reqwest::Error,
    },

    /// Every attempt ended in a retryable status or network failure.
    #[error("{message}")]
    Exhausted {
        /// The URL that could not be fetched.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Status of the last response, if any response was received.
        last_status: Option<u16>,
        /// Diagnostic summary (URL, attempt count, last status, last cause).
        message: String,
        /// The last network-level error, if any.
        #[source]
        source: Option<reqwest::Error>,
    },
}

impl FetchError {
    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a client construction error.
    pub fn client_build(source: reqwest::Error) -> Self {
        Self::ClientBuild { source }
    }

    /// Creates an exhaustion error.
    pub fn exhausted(
        url: impl Into<String>,
        attempts: u32,
        last_status: Option<u16>,
        message: impl Into<String>,
        source: Option<reqwest::Error>,
    ) -> Self {
        Self::Exhausted {
            url: url.into(),
            attempts,
            last_status,
            message: message.into(),
            source,
        }
    }
}

/// Builds the diagnostic message reported when attempts run out.
#[must_use]
pub(crate) fn exhaustion_message(
    url: &str,
    attempts: u32,
    last_status: Option<u16>,
    last_error: Option<&reqwest::Error>,
) -> String {
    let mut message = format!("failed to fetch {url} after {attempts} attempts");
    if let Some(status) = last_status {
        message.push_str(&format!(" (last HTTP status: {status})"));
    }
    if let Some(error) = last_error {
        message.push_str(&format!(" (last error: {error})"));
    }
    message
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_invalid_url_display() {
        let error = FetchError::invalid_url("not-a-url");
        let msg = error.to_string();
        assert!(msg.contains("invalid URL"), "Expected 'invalid URL' in: {msg}");
        assert!(msg.contains("not-a-url"), "Expected URL in: {msg}");
    }

    #[test]
    fn test_exhausted_display_is_message() {
        let message = exhaustion_message("https://example.com/search", 6, Some(429), None);
        let error = FetchError::exhausted("https://example.com/search", 6, Some(429), &message, None);
        let msg = error.to_string();
        assert_eq!(msg, message);
        assert!(msg.contains("https://example.com/search"), "Expected URL in: {msg}");
        assert!(msg.contains("6 attempts"), "Expected attempt count in: {msg}");
        assert!(msg.contains("429"), "Expected last status in: {msg}");
        assert!(error.source().is_none());
    }

    #[test]
    fn test_exhaustion_message_without_status() {
        let msg = exhaustion_message("https://example.com/", 3, None, None);
        assert_eq!(msg, "failed to fetch https://example.com/ after 3 attempts");
    }
}
