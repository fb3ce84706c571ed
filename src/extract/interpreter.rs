//! Turns parsed JSON blobs into listings.
//!
//! Every object reachable from a blob is tested against [`LISTING_SIGNATURES`].
//! Matching objects are normalized field by field; unknown keys are tolerated
//! and the whole object is kept as the listing's raw attributes.

use std::collections::HashSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::price::coerce_int;
use crate::listing::Listing;

/// Key sets that identify a listing-shaped object. Any one match is enough.
pub const LISTING_SIGNATURES: [&[&str]; 3] = [
    &["price", "url"],
    &["streetLine", "city", "price"],
    &["homeData", "url"],
];

const URL_KEYS: &[&str] = &["url", "URL", "listingUrl"];
const PRICE_KEYS: &[&str] = &["price", "listPrice", "value"];
const ADDRESS_KEYS: &[&str] = &["streetLine", "address", "streetAddress"];
const NESTED_ADDRESS_KEYS: &[&str] = &["streetAddress", "name", "value"];
const HOME_SQFT_KEYS: &[&str] = &["sqFt", "sqft", "livingArea", "livingAreaSqFt", "sqftValue"];
const LOT_SQFT_KEYS: &[&str] = &["lotSqFt", "lotSize", "lotSizeSqFt"];
const MLS_ID_KEYS: &[&str] = &["mlsId", "mlsListingId", "listingId", "id"];
const ZONING_KEYS: &[&str] = &["zoning", "zoningCode"];

/// True if `node` carries every key of at least one signature.
#[must_use]
pub fn looks_like_listing(node: &Map<String, Value>) -> bool {
    LISTING_SIGNATURES
        .iter()
        .any(|keys| keys.iter().all(|key| node.contains_key(*key)))
}

/// Extracts listings from parsed JSON values.
///
/// Top-level arrays are flattened one level; only objects are searched.
/// Objects without any identifying field are skipped, and once a URL has been
/// emitted later objects with the same URL are dropped.
#[must_use]
pub fn interpret(values: &[Value]) -> Vec<Listing> {
    let mut listings = Vec::new();
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut matched = 0usize;

    for root in roots(values) {
        let mut stack: Vec<&Value> = vec![root];
        while let Some(current) = stack.pop() {
            match current {
                Value::Object(node) => {
                    if looks_like_listing(node) {
                        matched += 1;
                        if let Some(listing) = normalize(node, &seen_urls) {
                            if let Some(url) = &listing.url {
                                seen_urls.insert(url.clone());
                            }
                            listings.push(listing);
                        }
                    }
                    stack.extend(node.values().rev());
                }
                Value::Array(items) => stack.extend(items.iter().rev()),
                _ => {}
            }
        }
    }

    debug!(matched, listings = listings.len(), "interpreted JSON blobs");
    listings
}

fn roots(values: &[Value]) -> impl Iterator<Item = &Value> {
    values.iter().flat_map(|value| match value {
        Value::Array(items) => items.iter().filter(|item| item.is_object()).collect::<Vec<_>>(),
        Value::Object(_) => vec![value],
        _ => Vec::new(),
    })
}

fn normalize(node: &Map<String, Value>, seen_urls: &HashSet<String>) -> Option<Listing> {
    let url = first_present(node, URL_KEYS)
        .and_then(Value::as_str)
        .map(str::to_string);
    if url.as_ref().is_some_and(|url| seen_urls.contains(url)) {
        return None;
    }

    let address = first_present(node, ADDRESS_KEYS).and_then(|value| match value {
        Value::String(text) => Some(text.clone()),
        Value::Object(nested) => first_present(nested, NESTED_ADDRESS_KEYS)
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    });

    let listing = Listing {
        mls_id: first_present(node, MLS_ID_KEYS).map(unwrap_value).and_then(coerce_text),
        address,
        city: node
            .get("city")
            .and_then(Value::as_str)
            .filter(|city| !city.is_empty())
            .map(str::to_string),
        price: int_field(node, PRICE_KEYS),
        home_sqft: int_field(node, HOME_SQFT_KEYS),
        lot_sqft: int_field(node, LOT_SQFT_KEYS),
        zoning: first_present(node, ZONING_KEYS).map(unwrap_value).and_then(coerce_text),
        url,
        raw: node.clone(),
    };

    listing.has_content().then_some(listing)
}

/// First value among `keys` that is present and truthy.
///
/// Null, `false`, zero, empty strings and empty containers count as absent.
fn first_present<'a>(node: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| node.get(*key))
        .find(|value| is_truthy(value))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Unwraps `{"value": x, ..}` wrappers to `x`; other values pass through.
fn unwrap_value(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("value").unwrap_or(value),
        _ => value,
    }
}

fn int_field(node: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    first_present(node, keys).map(unwrap_value).and_then(coerce_int)
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => (!text.is_empty()).then(|| text.clone()),
        other => Some(other.to_string()),
    }
}
