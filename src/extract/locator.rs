//! Finds JSON object literals embedded in page scripts.
//!
//! Two sources, in this order:
//!
//! 1. Every `<script type="application/ld+json">` body, taken whole.
//! 2. Every other script whose text mentions one of [`SCRIPT_MARKERS`],
//!    scanned for balanced top-level `{...}` spans.
//!
//! Nothing here parses JSON. Candidates that turn out not to be JSON are
//! dropped by the caller.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use tracing::trace;

/// Substrings that mark a script as likely to carry listing data.
pub const SCRIPT_MARKERS: [&str; 4] = ["homeData", "payload", "listings", "searchResults"];

/// Most brace-matched candidates taken from a single script.
pub const MAX_CANDIDATES_PER_SCRIPT: usize = 6;

const LD_JSON_TYPE: &str = "application/ld+json";

#[allow(clippy::expect_used)]
static SCRIPT_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("script").expect("script selector is valid"));

/// Where a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    /// Whole body of an LD+JSON script. May be an object or an array.
    LdJson,
    /// Balanced brace span inside a marker script. Always starts with `{`.
    Script,
}

/// An unparsed span of text suspected to be JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonCandidate {
    pub source: CandidateSource,
    pub text: String,
}

/// Collects JSON candidates from page markup. Never fails.
#[must_use]
pub fn locate_candidates(html: &str) -> Vec<JsonCandidate> {
    let document = Html::parse_document(html);
    let mut ld_json = Vec::new();
    let mut scanned = Vec::new();

    for script in document.select(&SCRIPT_SELECTOR) {
        let text: String = script.text().collect();
        let is_ld_json = script
            .value()
            .attr("type")
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case(LD_JSON_TYPE));

        if is_ld_json {
            let body = text.trim();
            if !body.is_empty() {
                ld_json.push(JsonCandidate {
                    source: CandidateSource::LdJson,
                    text: body.to_string(),
                });
            }
            continue;
        }

        if !SCRIPT_MARKERS.iter().any(|marker| text.contains(marker)) {
            continue;
        }

        let found = find_braced_candidates(&text, MAX_CANDIDATES_PER_SCRIPT);
        trace!(script_len = text.len(), candidates = found.len(), "scanned marker script");
        scanned.extend(found.into_iter().map(|span| JsonCandidate {
            source: CandidateSource::Script,
            text: span.to_string(),
        }));
    }

    ld_json.extend(scanned);
    ld_json
}

/// Returns up to `max` balanced top-level `{...}` spans of `text`.
///
/// Braces inside double-quoted strings (with backslash escapes) are ignored.
/// A `}` with no open brace is skipped. Spans come out in the order their
/// closing brace is reached; an unterminated trailing span is not emitted.
#[must_use]
pub fn find_braced_candidates(text: &str, max: usize) -> Vec<&str> {
    let mut found = Vec::new();
    if max == 0 {
        return found;
    }

    let mut depth: usize = 0;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (index, ch) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => {
                if depth == 0 {
                    start = index;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    found.push(&text[start..=index]);
                    if found.len() >= max {
                        break;
                    }
                }
            }
            _ => {}
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Brace Scanner Tests ====================

    #[test]
    fn test_nested_and_sibling_groups_yield_top_level_only() {
        let text = r#"var payload = {"a":{"b":1},"c":2}; var other = {"homeData":1,"url":"/home/2"};"#;
        let found = find_braced_candidates(text, 6);
        assert_eq!(
            found,
            vec![r#"{"a":{"b":1},"c":2}"#, r#"{"homeData":1,"url":"/home/2"}"#]
        );
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"x = {"text": "a } b { c", "n": 1};"#;
        assert_eq!(
            find_braced_candidates(text, 6),
            vec![r#"{"text": "a } b { c", "n": 1}"#]
        );
    }

    #[test]
    fn test_escaped_quote_does_not_end_string() {
        let text = r#"{"q": "say \"}\" now"} tail"#;
        assert_eq!(
            find_braced_candidates(text, 6),
            vec![r#"{"q": "say \"}\" now"}"#]
        );
    }

    #[test]
    fn test_stray_closing_brace_is_skipped() {
        let text = r#"} } {"a":1}"#;
        assert_eq!(find_braced_candidates(text, 6), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_unterminated_group_is_dropped() {
        let text = r#"{"a":1} {"b": {"c": 2}"#;
        assert_eq!(find_braced_candidates(text, 6), vec![r#"{"a":1}"#]);
    }

    #[test]
    fn test_stops_at_max_candidates() {
        let text = "{}".repeat(20);
        assert_eq!(find_braced_candidates(&text, 6).len(), 6);
        assert!(find_braced_candidates(&text, 0).is_empty());
    }

    #[test]
    fn test_multibyte_text_slices_on_char_boundaries() {
        let text = r#"ß {"city":"Zürich"} ü"#;
        assert_eq!(find_braced_candidates(text, 6), vec![r#"{"city":"Zürich"}"#]);
    }

    // ==================== Script Location Tests ====================

    #[test]
    fn test_ld_json_comes_before_marker_scripts() {
        let html = r#"<html><head>
            <script>window.payload = {"x": 1};</script>
            <script type="application/ld+json">{"price": 500000, "url": "/home/1"}</script>
            </head><body></body></html>"#;
        let found = locate_candidates(html);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].source, CandidateSource::LdJson);
        assert_eq!(found[0].text, r#"{"price": 500000, "url": "/home/1"}"#);
        assert_eq!(found[1].source, CandidateSource::Script);
        assert_eq!(found[1].text, r#"{"x": 1}"#);
    }

    #[test]
    fn test_scripts_without_markers_are_not_scanned() {
        let html = r#"<script>var config = {"theme": "dark"};</script>"#;
        assert!(locate_candidates(html).is_empty());
    }

    #[test]
    fn test_ld_json_array_body_kept_whole() {
        let html = r#"<script type="application/ld+json"> [{"a":1},{"b":2}] </script>"#;
        let found = locate_candidates(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, r#"[{"a":1},{"b":2}]"#);
    }

    #[test]
    fn test_empty_ld_json_is_skipped() {
        let html = r#"<script type="application/ld+json">   </script>"#;
        assert!(locate_candidates(html).is_empty());
    }

    #[test]
    fn test_per_script_limit_applies_to_each_script() {
        let body = r#"{"listings":1}"#.repeat(8);
        let html = format!("<script>{body}</script><script>{body}</script>");
        assert_eq!(locate_candidates(&html).len(), 12);
    }
}
