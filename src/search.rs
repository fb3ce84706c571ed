//! Saved search definitions loaded from a JSON file.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

/// Category whose listings must pass the keyword filter.
pub const KEYWORD_FILTERED_CATEGORY: &str = "DADU_play";

/// One saved search: a results page URL plus labels carried into the report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchDef {
    pub search_id: u64,
    pub category: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchFile {
    #[serde(default)]
    searches: Vec<SearchDef>,
}

/// Loads and validates search definitions from `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or parsed, a URL is blank, or two
/// searches share a `search_id`.
pub fn load_searches(path: &Path) -> Result<Vec<SearchDef>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read searches file '{}'", path.display()))?;
    parse_searches(&raw)
        .with_context(|| format!("Failed to parse searches file '{}'", path.display()))
}

/// Parses and validates a `{"searches": [...]}` document.
///
/// # Errors
///
/// Same conditions as [`load_searches`], minus file access.
pub fn parse_searches(raw: &str) -> Result<Vec<SearchDef>> {
    let file: SearchFile = serde_json::from_str(raw).context("Invalid searches JSON")?;

    let mut ids = HashSet::new();
    for search in &file.searches {
        if search.url.trim().is_empty() {
            bail!("Search {} has an empty `url`", search.search_id);
        }
        if !ids.insert(search.search_id) {
            bail!(
                "Duplicate search_id {}: search_id values must be unique",
                search.search_id
            );
        }
    }

    Ok(file.searches)
}
