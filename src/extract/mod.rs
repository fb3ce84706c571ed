//! Listing extraction from search-result pages.
//!
//! Pages carry listing data in inconsistent places, so extraction falls back
//! through layers:
//!
//! 1. JSON candidates from scripts ([`locate_candidates`]), parsed and
//!    searched for listing-shaped objects ([`interpret`]).
//! 2. Only if that yields nothing, property-page anchors in the visible
//!    markup ([`extract_cards`]).
//!
//! Malformed input never errors: bad candidates and odd fields are skipped.
//!
//! # Example
//!
//! ```
//! use listing_harvester::extract::{Strategy, extract};
//!
//! let html = r#"<script type="application/ld+json">{"price": 500000, "url": "/home/1"}</script>"#;
//! let extraction = extract(html, "https://www.redfin.com");
//! assert_eq!(extraction.listings.len(), 1);
//! assert_eq!(extraction.listings[0].url.as_deref(), Some("https://www.redfin.com/home/1"));
//! assert_eq!(extraction.diagnostics.strategy, Some(Strategy::Json));
//! ```

mod html_cards;
mod interpreter;
mod locator;
mod price;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

pub use html_cards::{CARD_TEXT_KEY, PROPERTY_LINK_MARKERS, extract_cards};
pub use interpreter::{LISTING_SIGNATURES, interpret, looks_like_listing};
pub use locator::{
    CandidateSource, JsonCandidate, MAX_CANDIDATES_PER_SCRIPT, SCRIPT_MARKERS,
    find_braced_candidates, locate_candidates,
};
pub use price::parse_price;

use crate::listing::Listing;

/// Which layer produced the listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Json,
    HtmlCards,
}

/// Counters describing one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// JSON candidates located in scripts.
    pub json_candidates: usize,
    /// Candidates that parsed into usable JSON blobs.
    pub json_blobs: usize,
    pub listings_from_json: usize,
    /// Set only when the HTML fallback ran.
    pub listings_from_html: Option<usize>,
    /// `None` when neither layer found anything.
    pub strategy: Option<Strategy>,
}

/// Listings plus diagnostics from one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub listings: Vec<Listing>,
    pub diagnostics: Diagnostics,
}

/// Extracts listings from page text.
///
/// Root-relative listing URLs (starting with `/`) are made absolute against
/// `base_url`; everything else passes through unchanged.
#[must_use]
#[instrument(skip(html), fields(html_len = html.len()))]
pub fn extract(html: &str, base_url: &str) -> Extraction {
    let candidates = locate_candidates(html);
    let blobs = parse_candidates(&candidates);
    let json_listings = interpret(&blobs);

    let mut diagnostics = Diagnostics {
        json_candidates: candidates.len(),
        json_blobs: blobs.len(),
        listings_from_json: json_listings.len(),
        ..Diagnostics::default()
    };

    let mut listings = if json_listings.is_empty() {
        let cards = extract_cards(html, base_url);
        diagnostics.listings_from_html = Some(cards.len());
        if !cards.is_empty() {
            diagnostics.strategy = Some(Strategy::HtmlCards);
        }
        cards
    } else {
        diagnostics.strategy = Some(Strategy::Json);
        json_listings
    };

    absolutize_urls(&mut listings, base_url);

    debug!(
        json_candidates = diagnostics.json_candidates,
        json_blobs = diagnostics.json_blobs,
        listings = listings.len(),
        strategy = ?diagnostics.strategy,
        "extraction finished"
    );

    Extraction {
        listings,
        diagnostics,
    }
}

/// Parses candidates, keeping objects (and LD+JSON arrays). Parse failures are dropped.
fn parse_candidates(candidates: &[JsonCandidate]) -> Vec<Value> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let value: Value = serde_json::from_str(&candidate.text).ok()?;
            let usable = match candidate.source {
                CandidateSource::LdJson => value.is_object() || value.is_array(),
                CandidateSource::Script => value.is_object(),
            };
            usable.then_some(value)
        })
        .collect()
}

fn absolutize_urls(listings: &mut [Listing], base_url: &str) {
    let Ok(base) = Url::parse(base_url) else {
        return;
    };
    for listing in listings {
        let Some(url) = listing.url.as_deref() else {
            continue;
        };
        if url.starts_with('/')
            && let Ok(absolute) = base.join(url)
        {
            listing.url = Some(absolute.to_string());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.redfin.com";

    // ==================== Strategy Tests ====================

    #[test]
    fn test_json_wins_over_html() {
        let html = r#"<html><body>
            <script type="application/ld+json">{"price": 500000, "url": "/home/1"}</script>
            <div>$450,000 <a href="/home/3">123 Main St</a></div>
            </body></html>"#;
        let extraction = extract(html, BASE);
        assert_eq!(extraction.listings.len(), 1);
        assert_eq!(extraction.diagnostics.strategy, Some(Strategy::Json));
        assert_eq!(extraction.diagnostics.listings_from_html, None);
    }

    #[test]
    fn test_falls_back_to_html_when_json_has_no_listings() {
        let html = r#"<html><body>
            <script>window.payload = {"config": {"theme": "dark"}};</script>
            <div>$450,000 <a href="/home/3">123 Main St</a></div>
            </body></html>"#;
        let extraction = extract(html, BASE);
        assert_eq!(extraction.diagnostics.json_candidates, 1);
        assert_eq!(extraction.diagnostics.json_blobs, 1);
        assert_eq!(extraction.diagnostics.listings_from_json, 0);
        assert_eq!(extraction.diagnostics.listings_from_html, Some(1));
        assert_eq!(extraction.diagnostics.strategy, Some(Strategy::HtmlCards));
        assert_eq!(extraction.listings[0].price, Some(450_000));
    }

    #[test]
    fn test_empty_page_has_no_strategy() {
        let extraction = extract("<html><body><p>No results</p></body></html>", BASE);
        assert!(extraction.listings.is_empty());
        assert_eq!(extraction.diagnostics.listings_from_html, Some(0));
        assert_eq!(extraction.diagnostics.strategy, None);
    }

    // ==================== Candidate Parsing Tests ====================

    #[test]
    fn test_malformed_candidates_are_dropped() {
        let candidates = vec![
            JsonCandidate {
                source: CandidateSource::Script,
                text: r#"{"a": undefined}"#.to_string(),
            },
            JsonCandidate {
                source: CandidateSource::LdJson,
                text: "[1, 2]".to_string(),
            },
            JsonCandidate {
                source: CandidateSource::LdJson,
                text: "\"just a string\"".to_string(),
            },
            JsonCandidate {
                source: CandidateSource::Script,
                text: r#"{"ok": true}"#.to_string(),
            },
        ];
        let blobs = parse_candidates(&candidates);
        assert_eq!(blobs.len(), 2);
    }

    // ==================== URL Normalization Tests ====================

    #[test]
    fn test_only_root_relative_urls_are_rewritten() {
        let mut listings = vec![
            Listing {
                url: Some("/home/1".to_string()),
                ..Listing::default()
            },
            Listing {
                url: Some("home/2".to_string()),
                ..Listing::default()
            },
            Listing {
                url: Some("https://other.example/home/3".to_string()),
                ..Listing::default()
            },
            Listing::default(),
        ];
        absolutize_urls(&mut listings, BASE);
        assert_eq!(listings[0].url.as_deref(), Some("https://www.redfin.com/home/1"));
        assert_eq!(listings[1].url.as_deref(), Some("home/2"));
        assert_eq!(listings[2].url.as_deref(), Some("https://other.example/home/3"));
        assert_eq!(listings[3].url, None);
    }

    #[test]
    fn test_diagnostics_serialize_snake_case() {
        let diagnostics = Diagnostics {
            strategy: Some(Strategy::HtmlCards),
            ..Diagnostics::default()
        };
        let json = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(json["strategy"], "html_cards");
        assert!(json["listings_from_html"].is_null());
    }
}
