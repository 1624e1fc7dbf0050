use once_cell::sync::Lazy;
use regex::Regex;

// Any whitespace run
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s+").expect("Invalid whitespace regex pattern")
});

/// Maximum characters kept for a single extracted product field
pub const MAX_FIELD_CHARS: usize = 300;

/// Marker appended whenever text is cut short
pub const ELLIPSIS: &str = "...";

/// Normalize whitespace: collapse multiple spaces/newlines into single space and trim
pub fn collapse_whitespace(content: &str) -> String {
    WHITESPACE_RE.replace_all(content, " ").trim().to_string()
}

/// Clean a product field for the tab-separated packing format.
///
/// Tabs and newlines would break the line format, so every whitespace run
/// becomes a single space before the field is capped.
pub fn clean_field(value: &str) -> String {
    take_chars(&collapse_whitespace(value), MAX_FIELD_CHARS)
}

/// First `max` characters of `s` (not bytes). Safe for non-ASCII content.
pub fn take_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Cap `s` at `max` characters, appending [`ELLIPSIS`] when anything was dropped.
///
/// Returns the capped text and whether truncation happened.
pub fn truncate_with_marker(s: &str, max: usize) -> (String, bool) {
    match s.char_indices().nth(max) {
        Some((idx, _)) => (format!("{}{}", &s[..idx], ELLIPSIS), true),
        None => (s.to_string(), false),
    }
}

pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
