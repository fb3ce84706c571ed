//! Keyword filtering and the heuristic deal score.

use crate::listing::Listing;
use crate::search::{KEYWORD_FILTERED_CATEGORY, SearchDef};

/// Substrings that qualify a listing for the keyword-filtered category.
pub const BUILDABLE_KEYWORDS: [&str; 8] = [
    "dadu",
    "adu",
    "accessory dwelling",
    "alley access",
    "large lot",
    "subdivide",
    "build",
    "corner",
];

/// Categories that earn a bonus for large lots.
const LAND_CATEGORIES: [&str; 3] = ["DADU_play", "Corner_Lot", "FixerWithLand"];
const FLIP_CATEGORY: &str = "Fix_n_flip";

const NEUTRAL_SCORE: f64 = 50.0;
const LARGE_LOT_SQFT: i64 = 6000;
const CHEAP_HOME_PPSF: f64 = 250.0;

/// True if the listing should be kept for this search.
///
/// Only searches in the keyword-filtered category are filtered. For those, the
/// search description, listing address and city, and any remark text in the raw
/// attributes are searched case-insensitively for [`BUILDABLE_KEYWORDS`].
#[must_use]
pub fn passes_keyword_filter(search: &SearchDef, listing: &Listing) -> bool {
    if search.category != KEYWORD_FILTERED_CATEGORY {
        return true;
    }

    let mut haystack = search.description.to_lowercase();
    for part in [listing.address.as_deref(), listing.city.as_deref()]
        .into_iter()
        .flatten()
        .chain(listing.remarks())
    {
        haystack.push(' ');
        haystack.push_str(&part.to_lowercase());
    }

    BUILDABLE_KEYWORDS
        .iter()
        .any(|keyword| haystack.contains(keyword))
}

/// Price per square foot rounded to cents, if both inputs are positive.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn price_per_sqft(price: Option<i64>, sqft: Option<i64>) -> Option<f64> {
    let (price, sqft) = (price?, sqft?);
    if price <= 0 || sqft <= 0 {
        return None;
    }
    Some(((price as f64 / sqft as f64) * 100.0).round() / 100.0)
}

/// Inputs to [`deal_rating`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DealInputs<'a> {
    pub price: Option<i64>,
    pub lot_sqft: Option<i64>,
    pub home_ppsf: Option<f64>,
    pub lot_ppsf: Option<f64>,
    pub category: &'a str,
}

/// Heuristic 0-100 deal score. 50 is neutral.
///
/// Cheaper homes per square foot, bigger and cheaper lots, and lower prices
/// raise the score. Each term is clamped so no single factor dominates.
#[must_use]
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn deal_rating(inputs: &DealInputs<'_>) -> u8 {
    let mut score = NEUTRAL_SCORE;

    if let Some(ppsf) = inputs.home_ppsf {
        score += ((300.0 - ppsf) / 6.0).clamp(-20.0, 25.0);
    }
    let lot_sqft = inputs.lot_sqft.filter(|lot| *lot != 0);
    if let Some(lot) = lot_sqft {
        score += ((lot - 3000) as f64 / 800.0).clamp(0.0, 25.0);
    }
    if let Some(lot_ppsf) = inputs.lot_ppsf {
        score += ((10.0 - lot_ppsf) * 0.5).clamp(-10.0, 10.0);
    }
    if let Some(price) = inputs.price.filter(|price| *price != 0) {
        score += ((450_000 - price) as f64 / 60_000.0).clamp(-10.0, 10.0);
    }

    if LAND_CATEGORIES.contains(&inputs.category)
        && lot_sqft.is_some_and(|lot| lot >= LARGE_LOT_SQFT)
    {
        score += 5.0;
    }
    if inputs.category == FLIP_CATEGORY
        && inputs.home_ppsf.is_some_and(|ppsf| ppsf <= CHEAP_HOME_PPSF)
    {
        score += 5.0;
    }

    score.round().clamp(0.0, 100.0) as u8
}
