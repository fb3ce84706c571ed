//! Browser identities and request headers used by the fetcher.
//!
//! Search pages are served to browsers, so every attempt presents itself as one:
//! a user-agent drawn from a small rotation pool plus the navigation headers a
//! real browser sends for a top-level document load.

use rand::Rng;
use rand::seq::SliceRandom;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, DNT, HeaderMap, HeaderName, HeaderValue, PRAGMA,
    REFERER, UPGRADE_INSECURE_REQUESTS, USER_AGENT,
};
use tracing::warn;

/// Default rotation pool of realistic desktop browser user-agents.
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.5 Safari/605.1.15",
];

const ACCEPT_DOCUMENT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Resolves the user-agent pool for a fetch.
///
/// Caller-supplied entries that cannot be sent as a header value are dropped.
/// An absent or effectively empty override selects [`DEFAULT_USER_AGENTS`].
#[must_use]
pub(crate) fn resolve_pool(overrides: Option<&[String]>) -> Vec<String> {
    let usable: Vec<String> = overrides
        .unwrap_or_default()
        .iter()
        .filter(|ua| {
            let valid = !ua.trim().is_empty() && HeaderValue::from_str(ua).is_ok();
            if !valid {
                warn!(user_agent = %ua, "dropping unusable user-agent override");
            }
            valid
        })
        .cloned()
        .collect();

    if usable.is_empty() {
        DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()
    } else {
        usable
    }
}

/// Picks one user-agent uniformly at random from a resolved pool.
pub(crate) fn choose<'a, R: Rng + ?Sized>(pool: &'a [String], rng: &mut R) -> &'a str {
    pool.choose(rng)
        .map_or(DEFAULT_USER_AGENTS[0], String::as_str)
}

/// Builds the browser-like header set for one attempt.
pub(crate) fn browser_headers(user_agent: &str, referer: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_DOCUMENT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(DNT, HeaderValue::from_static("1"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    if let Ok(value) = HeaderValue::from_str(referer) {
        headers.insert(REFERER, value);
    }
    for (name, value) in [
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "same-origin"),
        ("sec-fetch-user", "?1"),
    ] {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_resolve_pool_defaults_when_absent() {
        let pool = resolve_pool(None);
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
        assert!(pool.iter().all(|ua| ua.starts_with("Mozilla/5.0")));
    }

    #[test]
    fn test_resolve_pool_defaults_when_override_empty() {
        let pool = resolve_pool(Some(Vec::new().as_slice()));
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
    }

    #[test]
    fn test_resolve_pool_drops_invalid_entries() {
        let overrides = vec![
            "agent-one".to_string(),
            "bad\nagent".to_string(),
            "   ".to_string(),
        ];
        let pool = resolve_pool(Some(overrides.as_slice()));
        assert_eq!(pool, vec!["agent-one".to_string()]);
    }

    #[test]
    fn test_choose_is_deterministic_for_seeded_rng() {
        let pool = resolve_pool(None);
        let first: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| choose(&pool, &mut rng).to_string()).collect()
        };
        let second: Vec<String> = {
            let mut rng = StdRng::seed_from_u64(42);
            (0..8).map(|_| choose(&pool, &mut rng).to_string()).collect()
        };
        assert_eq!(first, second);
        assert!(first.iter().all(|ua| pool.contains(ua)));
    }

    #[test]
    fn test_browser_headers_include_navigation_hints() {
        let headers = browser_headers("agent-one", "https://www.example.com/");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "agent-one");
        assert_eq!(headers.get(REFERER).unwrap(), "https://www.example.com/");
        assert_eq!(headers.get(CACHE_CONTROL).unwrap(), "no-cache");
        assert_eq!(headers.get("sec-fetch-mode").unwrap(), "navigate");
        assert_eq!(headers.get("sec-fetch-dest").unwrap(), "document");
        assert!(
            headers
                .get(ACCEPT)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }
}
