//! Parcel and location-value lookup tables loaded from CSV folders.
//!
//! Both loaders read every `*.csv` file under their directory tree in sorted
//! path order, skip `*.csv.example` templates and skip files whose headers do
//! not carry the columns they need. A missing directory yields an empty table.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use tracing::{debug, info};

/// Default parcel table folder.
pub const PARCEL_LOOKUP_DIR: &str = "lookups/parcel";

/// Default location-value table folders. Both spellings are searched.
pub const LOCATION_LOOKUP_DIRS: [&str; 2] = ["lookups/location", "lookups/Location"];

/// Default accepted distance between a listing zip and a parcel zip.
pub const DEFAULT_ZIP_TOLERANCE: u32 = 4;

const PARCEL_COLUMN: &str = "taxparcelnumber";
const ZIP_COLUMN: &str = "zipcode";
const ADDRESS_COLUMN: &str = "site_address";
const PREFERRED_VALUE_COLUMNS: [&str; 2] = ["location_value", "value"];

#[allow(clippy::expect_used)]
static ZIP_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{5})\b").expect("valid regex"));

#[allow(clippy::expect_used)]
static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid regex"));

/// Street suffix and direction abbreviations applied per token.
const ABBREVIATIONS: [(&str, &str); 13] = [
    ("STREET", "ST"),
    ("AVENUE", "AVE"),
    ("ROAD", "RD"),
    ("DRIVE", "DR"),
    ("LANE", "LN"),
    ("COURT", "CT"),
    ("PLACE", "PL"),
    ("BOULEVARD", "BLVD"),
    ("PARKWAY", "PKWY"),
    ("NORTH", "N"),
    ("SOUTH", "S"),
    ("EAST", "E"),
    ("WEST", "W"),
];

/// First standalone five-digit group, so `"98103-1234"` becomes `"98103"`.
#[must_use]
pub fn normalize_zip(zip: &str) -> Option<&str> {
    ZIP_PATTERN
        .captures(zip)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn zip_number(zip: &str) -> Option<u32> {
    normalize_zip(zip).and_then(|z| z.parse().ok())
}

/// Uppercases, strips punctuation, collapses whitespace and abbreviates tokens.
///
/// ```
/// use listing_harvester::lookup::normalize_address;
///
/// assert_eq!(normalize_address("123 North Main Street."), "123 N MAIN ST");
/// ```
#[must_use]
pub fn normalize_address(address: &str) -> String {
    let upper = address.trim().to_uppercase();
    let cleaned = PUNCTUATION.replace_all(&upper, " ");
    cleaned
        .split_whitespace()
        .map(|token| {
            ABBREVIATIONS
                .iter()
                .find(|(long, _)| *long == token)
                .map_or(token, |(_, short)| *short)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized site address to `(zip, parcel)` candidates in file order.
#[derive(Debug, Clone, Default)]
pub struct ParcelLookup {
    by_address: HashMap<String, Vec<(Option<u32>, String)>>,
}

impl ParcelLookup {
    /// Number of distinct normalized addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }

    /// Adds one table row. Rows without a parcel number or address are ignored.
    pub fn insert(&mut self, site_address: &str, zip: &str, parcel: &str) {
        let parcel = parcel.trim();
        let address = normalize_address(site_address);
        if parcel.is_empty() || address.is_empty() {
            return;
        }
        self.by_address
            .entry(address)
            .or_default()
            .push((zip_number(zip), parcel.to_string()));
    }

    /// Parcel number for `site_address`.
    ///
    /// Without a usable listing zip the first candidate wins. Otherwise the
    /// candidate whose zip is closest (within `zip_tolerance`) wins, ties going
    /// to the earlier row. Nothing within tolerance means no match.
    #[must_use]
    pub fn find(&self, zip: Option<&str>, site_address: &str, zip_tolerance: u32) -> Option<&str> {
        let candidates = self.by_address.get(&normalize_address(site_address))?;
        let Some(target) = zip.and_then(zip_number) else {
            return candidates.first().map(|(_, parcel)| parcel.as_str());
        };

        let mut best: Option<(u32, &str)> = None;
        for (candidate_zip, parcel) in candidates {
            let Some(candidate_zip) = candidate_zip else {
                continue;
            };
            let distance = candidate_zip.abs_diff(target);
            if distance <= zip_tolerance && best.is_none_or(|(d, _)| distance < d) {
                best = Some((distance, parcel));
            }
        }
        best.map(|(_, parcel)| parcel)
    }
}

/// Tax parcel number to location value. The first value seen for a parcel wins.
#[derive(Debug, Clone, Default)]
pub struct LocationValueLookup {
    by_parcel: HashMap<String, String>,
}

impl LocationValueLookup {
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_parcel.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_parcel.is_empty()
    }

    /// Adds one row unless the parcel already has a value. Blank cells are ignored.
    pub fn insert(&mut self, parcel: &str, value: &str) {
        let (parcel, value) = (parcel.trim(), value.trim());
        if parcel.is_empty() || value.is_empty() {
            return;
        }
        self.by_parcel
            .entry(parcel.to_string())
            .or_insert_with(|| value.to_string());
    }

    #[must_use]
    pub fn find(&self, parcel: &str) -> Option<&str> {
        self.by_parcel.get(parcel.trim()).map(String::as_str)
    }
}

/// Loads every parcel table under `dir`.
///
/// Files need `taxparcelnumber`, `zipcode` and `site_address` columns (any
/// case); other CSV files in the folder are skipped.
///
/// # Errors
///
/// Fails if the folder cannot be listed or a table cannot be read.
pub fn load_parcel_lookup(dir: &Path) -> Result<ParcelLookup> {
    let mut lookup = ParcelLookup::default();
    for path in csv_files(&[dir])? {
        let mut reader = open_table(&path)?;
        let headers = header_index(&mut reader, &path)?;
        let (Some(&parcel), Some(&zip), Some(&address)) = (
            headers.get(PARCEL_COLUMN),
            headers.get(ZIP_COLUMN),
            headers.get(ADDRESS_COLUMN),
        ) else {
            debug!(path = %path.display(), "not a parcel table, skipping");
            continue;
        };

        for record in reader.records() {
            let record =
                record.with_context(|| format!("Failed to read row in '{}'", path.display()))?;
            let cell = |i: usize| record.get(i).unwrap_or_default();
            lookup.insert(cell(address), cell(zip), cell(parcel));
        }
    }
    info!(addresses = lookup.len(), "parcel lookup loaded");
    Ok(lookup)
}

/// Loads every location-value table under `dirs`.
///
/// The value column is `location_value`, else `value`, else the single
/// column other than `taxparcelnumber`. Files where it cannot be inferred are
/// skipped.
///
/// # Errors
///
/// Fails if a folder cannot be listed or a table cannot be read.
pub fn load_location_value_lookup<P: AsRef<Path>>(dirs: &[P]) -> Result<LocationValueLookup> {
    let dirs: Vec<&Path> = dirs.iter().map(AsRef::as_ref).collect();
    let mut lookup = LocationValueLookup::default();
    for path in csv_files(&dirs)? {
        let mut reader = open_table(&path)?;
        let headers = header_index(&mut reader, &path)?;
        let Some(&parcel) = headers.get(PARCEL_COLUMN) else {
            debug!(path = %path.display(), "no parcel column, skipping");
            continue;
        };
        let value = PREFERRED_VALUE_COLUMNS
            .iter()
            .find_map(|name| headers.get(*name).copied())
            .or_else(|| single_other_column(reader.byte_headers().map_or(0, |h| h.len()), parcel));
        let Some(value) = value else {
            debug!(path = %path.display(), "cannot infer value column, skipping");
            continue;
        };

        for record in reader.records() {
            let record =
                record.with_context(|| format!("Failed to read row in '{}'", path.display()))?;
            lookup.insert(
                record.get(parcel).unwrap_or_default(),
                record.get(value).unwrap_or_default(),
            );
        }
    }
    info!(parcels = lookup.len(), "location value lookup loaded");
    Ok(lookup)
}

fn single_other_column(column_count: usize, parcel: usize) -> Option<usize> {
    (column_count == 2).then_some(1 - parcel)
}

fn open_table(path: &Path) -> Result<csv::Reader<fs::File>> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open lookup table '{}'", path.display()))
}

/// Lowercased, trimmed header name to column index. The first duplicate wins.
fn header_index(reader: &mut csv::Reader<fs::File>, path: &Path) -> Result<HashMap<String, usize>> {
    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read header of '{}'", path.display()))?;
    let mut index = HashMap::new();
    for (i, name) in headers.iter().enumerate() {
        let name = name.trim_start_matches('\u{feff}').trim().to_lowercase();
        index.entry(name).or_insert(i);
    }
    Ok(index)
}

fn is_table(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    name.ends_with(".csv") && !name.ends_with(".csv.example")
}

/// All table files under `dirs`, recursively, deduplicated and sorted.
fn csv_files(dirs: &[&Path]) -> Result<BTreeSet<PathBuf>> {
    let mut found = BTreeSet::new();
    let mut pending: Vec<PathBuf> = dirs
        .iter()
        .filter(|dir| dir.is_dir())
        .map(|dir| dir.to_path_buf())
        .collect();

    while let Some(dir) = pending.pop() {
        let entries = fs::read_dir(&dir)
            .with_context(|| format!("Failed to list lookup folder '{}'", dir.display()))?;
        for entry in entries {
            let path = entry
                .with_context(|| format!("Failed to list lookup folder '{}'", dir.display()))?
                .path();
            if path.is_dir() {
                pending.push(path);
            } else if is_table(&path) {
                found.insert(path);
            }
        }
    }
    Ok(found)
}
