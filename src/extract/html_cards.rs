//! Last-resort extraction from visible listing cards.
//!
//! Used only when no embedded JSON produced a listing. Each anchor pointing
//! at a property page becomes one listing, with price and address scraped from
//! the text of the anchor's container.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::price::parse_price;
use crate::listing::Listing;

/// Link path fragments that identify a property page.
pub const PROPERTY_LINK_MARKERS: [&str; 2] = ["/home/", "/property/"];

/// Raw attribute key holding the card text a fallback listing was built from.
pub const CARD_TEXT_KEY: &str = "card_text";

#[allow(clippy::expect_used)]
static ANCHOR_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("anchor selector is valid"));

/// `$` amount with separators and an optional K/M suffix.
#[allow(clippy::expect_used)]
static CARD_PRICE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\d[\d,\.]*)([MK])?").expect("card price regex is valid") // Static pattern, safe to panic
});

/// House number followed by a street name, stopping at the first comma.
#[allow(clippy::expect_used)]
static CARD_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,6}\s+[^,]{3,60})\b").expect("card address regex is valid") // Static pattern, safe to panic
});

/// Builds listings from property-page anchors, first occurrence per URL.
///
/// Links are resolved against `base_url`; if it is not a valid URL the link
/// is kept as written.
#[must_use]
pub fn extract_cards(html: &str, base_url: &str) -> Vec<Listing> {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();
    let mut seen: HashSet<String> = HashSet::new();
    let mut listings = Vec::new();

    for anchor in document.select(&ANCHOR_SELECTOR) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if !PROPERTY_LINK_MARKERS.iter().any(|marker| href.contains(marker)) {
            continue;
        }

        let url = resolve(base.as_ref(), href);
        if !seen.insert(url.clone()) {
            continue;
        }

        let blob = card_text(anchor);
        let mut raw = Map::new();
        raw.insert(CARD_TEXT_KEY.to_string(), Value::String(blob.clone()));

        listings.push(Listing {
            price: card_price(&blob),
            address: card_address(&blob),
            url: Some(url),
            raw,
            ..Listing::default()
        });
    }

    debug!(listings = listings.len(), "extracted HTML cards");
    listings
}

fn resolve(base: Option<&Url>, href: &str) -> String {
    base.and_then(|base| base.join(href).ok())
        .map_or_else(|| href.to_string(), |url| url.to_string())
}

/// Container text, or the anchor's own text when there is no container text.
fn card_text(anchor: ElementRef<'_>) -> String {
    let container = anchor
        .parent()
        .and_then(ElementRef::wrap)
        .map(|parent| collapse_whitespace(parent.text()))
        .unwrap_or_default();
    if container.is_empty() {
        collapse_whitespace(anchor.text())
    } else {
        container
    }
}

fn collapse_whitespace<'a>(pieces: impl Iterator<Item = &'a str>) -> String {
    pieces
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn card_price(blob: &str) -> Option<i64> {
    CARD_PRICE.find(blob).and_then(|m| parse_price(m.as_str()))
}

/// Price tokens are blanked first so a price tail like `000` is never read as a house number.
fn card_address(blob: &str) -> Option<String> {
    let without_prices = CARD_PRICE.replace_all(blob, " ");
    CARD_ADDRESS
        .captures(&without_prices)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|address| !address.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.redfin.com";

    // ==================== Card Text Tests ====================

    #[test]
    fn test_price_and_address_from_container() {
        let html = r#"<div class="card"><span>$450,000</span> <a href="/home/3">123 Main St</a></div>"#;
        let listings = extract_cards(html, BASE);
        assert_eq!(listings.len(), 1);
        let listing = &listings[0];
        assert_eq!(listing.price, Some(450_000));
        assert_eq!(listing.address.as_deref(), Some("123 Main St"));
        assert_eq!(listing.url.as_deref(), Some("https://www.redfin.com/home/3"));
        assert_eq!(
            listing.raw.get(CARD_TEXT_KEY).and_then(Value::as_str),
            Some("$450,000 123 Main St")
        );
        assert_eq!(listing.city, None);
        assert_eq!(listing.mls_id, None);
    }

    #[test]
    fn test_suffixed_price() {
        assert_eq!(card_price("Just listed $1.2M 3 beds"), Some(1_200_000));
        assert_eq!(card_price("$725K"), Some(725_000));
        assert_eq!(card_price("no price here"), None);
    }

    #[test]
    fn test_address_stops_at_comma() {
        assert_eq!(
            card_address("$899,000 4521 Fremont Ave N, Seattle, WA 98103").as_deref(),
            Some("4521 Fremont Ave N")
        );
    }

    #[test]
    fn test_address_absent_without_house_number() {
        assert_eq!(card_address("$500,000 Charming bungalow"), None);
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let html = "<div>\n  $500,000\n\n  <a href=\"/home/1\">  12   Oak   Rd </a>\n</div>";
        let listing = &extract_cards(html, BASE)[0];
        assert_eq!(listing.address.as_deref(), Some("12 Oak Rd"));
    }

    // ==================== Link Tests ====================

    #[test]
    fn test_non_property_links_ignored() {
        let html = r#"<div><a href="/about">About</a><a href="/city/1/WA/Seattle">Seattle</a></div>"#;
        assert!(extract_cards(html, BASE).is_empty());
    }

    #[test]
    fn test_property_links_and_absolute_urls() {
        let html = r#"<ul>
            <li><a href="/property/77">77 Pine St</a></li>
            <li><a href="https://other.example/home/5">5 Elm St</a></li>
        </ul>"#;
        let urls: Vec<String> = extract_cards(html, BASE)
            .into_iter()
            .filter_map(|l| l.url)
            .collect();
        assert_eq!(
            urls,
            vec!["https://www.redfin.com/property/77", "https://other.example/home/5"]
        );
    }

    #[test]
    fn test_duplicate_links_keep_first_card() {
        let html = r#"
            <div><a href="/home/1">$100,000 1 First Ave</a></div>
            <div><a href="/home/1">$999,000 9 Other Ave</a></div>"#;
        let listings = extract_cards(html, BASE);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price, Some(100_000));
    }

    #[test]
    fn test_invalid_base_keeps_href() {
        let html = r#"<div><a href="/home/1">x</a></div>"#;
        let listing = &extract_cards(html, "not a base")[0];
        assert_eq!(listing.url.as_deref(), Some("/home/1"));
    }

    #[test]
    fn test_empty_anchor_still_emitted() {
        let html = r#"<a href="/home/8"></a>"#;
        let listings = extract_cards(html, BASE);
        assert_eq!(listings.len(), 1);
        assert!(listings[0].has_content());
    }
}
