//! Consolidated CSV report of scored listings.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};

use crate::listing::Listing;
use crate::scoring::{DealInputs, deal_rating, price_per_sqft};
use crate::search::SearchDef;

/// File name of the consolidated report inside the daily directory.
pub const REPORT_FILE_NAME: &str = "all_listings.csv";

/// Report columns, in output order.
pub const REPORT_COLUMNS: [&str; 15] = [
    "mls_listing_id",
    "search_id",
    "search_category",
    "city",
    "address",
    "listing_price",
    "home_sqft",
    "lot_sqft",
    "zoning",
    "home_price_per_sqft",
    "lot_price_per_sqft",
    "deal_rating",
    "listing_url",
    "search_description",
    "search_url",
];

/// One report line: a listing scored in the context of the search that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub mls_listing_id: Option<String>,
    pub search_id: u64,
    pub search_category: String,
    pub city: Option<String>,
    pub address: Option<String>,
    pub listing_price: Option<i64>,
    pub home_sqft: Option<i64>,
    pub lot_sqft: Option<i64>,
    pub zoning: Option<String>,
    pub home_price_per_sqft: Option<f64>,
    pub lot_price_per_sqft: Option<f64>,
    pub deal_rating: u8,
    pub listing_url: Option<String>,
    pub search_description: String,
    pub search_url: String,
}

impl ReportRow {
    /// Scores `listing` for `search`. The search's city wins over the listing's.
    #[must_use]
    pub fn new(search: &SearchDef, listing: &Listing) -> Self {
        let home_ppsf = price_per_sqft(listing.price, listing.home_sqft);
        let lot_ppsf = price_per_sqft(listing.price, listing.lot_sqft);
        let rating = deal_rating(&DealInputs {
            price: listing.price,
            lot_sqft: listing.lot_sqft,
            home_ppsf,
            lot_ppsf,
            category: &search.category,
        });
        let city = if search.city.is_empty() {
            listing.city.clone()
        } else {
            Some(search.city.clone())
        };

        Self {
            mls_listing_id: listing.mls_id.clone(),
            search_id: search.search_id,
            search_category: search.category.clone(),
            city,
            address: listing.address.clone(),
            listing_price: listing.price,
            home_sqft: listing.home_sqft,
            lot_sqft: listing.lot_sqft,
            zoning: listing.zoning.clone(),
            home_price_per_sqft: home_ppsf,
            lot_price_per_sqft: lot_ppsf,
            deal_rating: rating,
            listing_url: listing.url.clone(),
            search_description: search.description.clone(),
            search_url: search.url.clone(),
        }
    }

    fn cells(&self) -> [String; 15] {
        [
            opt(self.mls_listing_id.as_ref()),
            self.search_id.to_string(),
            self.search_category.clone(),
            opt(self.city.as_ref()),
            opt(self.address.as_ref()),
            opt(self.listing_price.as_ref()),
            opt(self.home_sqft.as_ref()),
            opt(self.lot_sqft.as_ref()),
            opt(self.zoning.as_ref()),
            opt(self.home_price_per_sqft.as_ref()),
            opt(self.lot_price_per_sqft.as_ref()),
            self.deal_rating.to_string(),
            opt(self.listing_url.as_ref()),
            self.search_description.clone(),
            self.search_url.clone(),
        ]
    }
}

fn opt<T: ToString>(value: Option<&T>) -> String {
    value.map(ToString::to_string).unwrap_or_default()
}

/// `root/YYYY/MM/DD` for `date`.
#[must_use]
pub fn daily_output_dir(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(format!("{:04}", date.year()))
        .join(format!("{:02}", date.month()))
        .join(format!("{:02}", date.day()))
}

/// Writes a header plus one line per row, creating parent directories.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub fn write_report_csv(rows: &[ReportRow], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create report directory '{}'", parent.display()))?;
    }

    let mut out = REPORT_COLUMNS.join(",");
    out.push_str("\r\n");
    for row in rows {
        let line = row
            .cells()
            .iter()
            .map(|cell| csv_field(cell))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push_str("\r\n");
    }

    fs::write(path, out)
        .with_context(|| format!("Failed to write report '{}'", path.display()))
}

/// Quotes a field if it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
