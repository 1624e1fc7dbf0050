use once_cell::sync::Lazy;
use regex::Regex;

use crate::products::ProductRecord;

/// URLs shorter than this are too generic to look for verbatim
const MIN_LITERAL_URL_CHARS: usize = 10;

static MARKDOWN_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\]\(\s*(https?://[^)\s]+)\s*\)").expect("Invalid markdown link regex")
});

static BARE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)https?://[\w\-._~:/?#\[\]@!$&'()*+,;=%]+").expect("Invalid bare URL regex")
});

/// Trim and drop a single trailing slash
pub fn normalize_url_for_match(url: &str) -> String {
    let trimmed = url.trim();
    trimmed.strip_suffix('/').unwrap_or(trimmed).to_string()
}

/// Two URLs match when their normalized forms are equal or one contains the other.
///
/// Containment means `/p/1` matches `/p/12`; answers that name the longer URL
/// also surface the shorter product.
pub fn urls_match(a: &str, b: &str) -> bool {
    let a = normalize_url_for_match(a);
    let b = normalize_url_for_match(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || a.contains(&b) || b.contains(&a)
}

/// Whether the answer refers to `url`, literally, as a markdown link target or as a bare URL
pub fn url_in_answer(url: &str, answer: &str) -> bool {
    let normalized = normalize_url_for_match(url);
    if normalized.chars().count() > MIN_LITERAL_URL_CHARS && answer.contains(&normalized) {
        return true;
    }
    let raw = url.trim();
    if raw.chars().count() > MIN_LITERAL_URL_CHARS && answer.contains(raw) {
        return true;
    }
    if MARKDOWN_LINK_RE
        .captures_iter(answer)
        .filter_map(|caps| caps.get(1))
        .any(|target| urls_match(url, target.as_str()))
    {
        return true;
    }
    BARE_URL_RE.find_iter(answer).any(|m| urls_match(url, m.as_str()))
}

/// Products the answer mentions, in catalog order
pub fn correlate(products: &[ProductRecord], answer: &str) -> Vec<ProductRecord> {
    if answer.trim().is_empty() {
        return Vec::new();
    }
    products
        .iter()
        .filter(|p| url_in_answer(&p.url, answer))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(url: &str) -> ProductRecord {
        ProductRecord::new("Item", url, "", "")
    }

    #[test]
    fn test_trailing_slash_is_ignored() {
        assert!(urls_match("https://shop.test/products/1/", "https://shop.test/products/1"));
        assert!(urls_match(" https://shop.test/products/1", "https://shop.test/products/1/"));
        assert!(!urls_match("", "https://shop.test/"));
    }

    #[test]
    fn test_markdown_link_target() {
        let products = vec![product("https://shop.test/products/1"), product("https://shop.test/products/2")];
        let answer = "Check [here](https://shop.test/products/1/)";
        assert_eq!(correlate(&products, answer), vec![products[0].clone()]);
    }

    #[test]
    fn test_bare_url_and_order() {
        let products = vec![
            product("https://shop.test/products/a"),
            product("https://shop.test/products/b"),
            product("https://shop.test/products/c"),
        ];
        let answer = "Best: https://shop.test/products/c/ then https://shop.test/products/a.";
        let matched = correlate(&products, answer);
        let urls: Vec<_> = matched.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["https://shop.test/products/a", "https://shop.test/products/c"]);
    }

    #[test]
    fn test_short_urls_need_a_link() {
        let products = vec![product("http://a.b/")];
        assert!(correlate(&products, "go to http://a.b").len() == 1);
        assert!(correlate(&products, "text mentioning a.b only").is_empty());
    }

    #[test]
    fn test_prefix_over_match_is_kept() {
        let products = vec![product("https://shop.test/p/1"), product("https://shop.test/p/12")];
        let matched = correlate(&products, "Only https://shop.test/p/12 is in stock");
        assert_eq!(matched.len(), 2);
    }

    #[test]
    fn test_no_mentions() {
        let products = vec![product("https://shop.test/products/1")];
        assert!(correlate(&products, "I recommend the blue one.").is_empty());
        assert!(correlate(&products, "").is_empty());
    }
}
