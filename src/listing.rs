//! The extracted listing record.

use serde::Serialize;
use serde_json::{Map, Value};

/// Raw attribute keys that carry free-text listing remarks.
///
/// These are never interpreted during extraction but stay in [`Listing::raw`]
/// so keyword filters can inspect them.
pub const REMARK_KEYS: [&str; 5] = [
    "remarks",
    "publicRemarks",
    "description",
    "listingRemarks",
    "propertyDescription",
];

/// One property search result.
///
/// Every field except `raw` is optional. Extraction never emits a listing
/// without at least one of address, city, price, square footages, or URL
/// (see [`Listing::has_content`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Listing {
    /// MLS-like identifier, coerced to text.
    pub mls_id: Option<String>,
    /// Street address line.
    pub address: Option<String>,
    pub city: Option<String>,
    /// Price in whole currency units.
    pub price: Option<i64>,
    pub home_sqft: Option<i64>,
    pub lot_sqft: Option<i64>,
    pub zoning: Option<String>,
    /// Listing URL; absolute once it leaves [`crate::extract::extract`].
    pub url: Option<String>,
    /// The source node this listing was built from, verbatim.
    pub raw: Map<String, Value>,
}

impl Listing {
    /// True if any identifying field is present. Zero numbers do not count.
    #[must_use]
    pub fn has_content(&self) -> bool {
        let nonzero = |n: Option<i64>| n.is_some_and(|n| n != 0);
        self.address.is_some()
            || self.city.is_some()
            || nonzero(self.price)
            || nonzero(self.home_sqft)
            || nonzero(self.lot_sqft)
            || self.url.is_some()
    }

    /// Non-empty remark strings from the raw attributes, in [`REMARK_KEYS`] order.
    pub fn remarks(&self) -> impl Iterator<Item = &str> {
        REMARK_KEYS
            .iter()
            .filter_map(|key| self.raw.get(*key).and_then(Value::as_str))
            .filter(|text| !text.trim().is_empty())
    }
}
