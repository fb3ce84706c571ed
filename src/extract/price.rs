//! Lenient currency and integer parsing for listing fields.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Number with an optional thousand/million suffix, after `$` and `,` are stripped.
#[allow(clippy::expect_used)]
static SUFFIXED_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)([mk])?$").expect("amount regex is valid") // Static pattern, safe to panic
});

/// Largest float magnitude that truncates into an `i64` without saturating.
const I64_FLOAT_LIMIT: f64 = 9.2e18;

/// Parses a price-like string into whole currency units.
///
/// Accepts `"$1,234,567"`, `"1234"`, `"1.2M"`, `"450k"` and any plain float
/// literal. Fractions are truncated. Returns `None` for anything else,
/// including empty input.
///
/// ```
/// use listing_harvester::extract::parse_price;
///
/// assert_eq!(parse_price("$1,234,567"), Some(1_234_567));
/// assert_eq!(parse_price("1.2M"), Some(1_200_000));
/// assert_eq!(parse_price("450k"), Some(450_000));
/// assert_eq!(parse_price("call for price"), None);
/// ```
#[must_use]
pub fn parse_price(text: &str) -> Option<i64> {
    let cleaned = text.trim().replace(['$', ','], "").to_lowercase();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }

    if let Some(caps) = SUFFIXED_AMOUNT.captures(cleaned) {
        let amount: f64 = caps.get(1)?.as_str().parse().ok()?;
        let scale = match caps.get(2).map(|m| m.as_str()) {
            Some("m") => 1_000_000.0,
            Some("k") => 1_000.0,
            _ => 1.0,
        };
        return truncate(amount * scale);
    }

    truncate(cleaned.parse().ok()?)
}

/// Coerces a JSON scalar into an integer.
///
/// Numbers are truncated, strings go through [`parse_price`]. Booleans, null
/// and containers yield `None`.
#[must_use]
pub(crate) fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate)),
        Value::String(text) => parse_price(text),
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(value: f64) -> Option<i64> {
    if value.is_finite() && value.abs() < I64_FLOAT_LIMIT {
        Some(value.trunc() as i64)
    } else {
        None
    }
}
