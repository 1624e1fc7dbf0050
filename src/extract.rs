use std::collections::HashSet;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use url::Url;

use crate::error::Result;
use crate::normalize::{char_len, collapse_whitespace, truncate_with_marker};
use crate::page::{document_base, element_text, resolve_href, run_bounded, selector, BrowserEngine, DomSnapshot};

/// Content cap for plain extraction
pub const MAX_CONTENT_CHARS: usize = 8000;

/// Content cap when a link list is attached
pub const MAX_CONTENT_WITH_LINKS_CHARS: usize = MAX_CONTENT_CHARS * 2;

/// Candidates shorter than this lose to the next fallback
pub const MIN_CANDIDATE_CHARS: usize = 100;

/// Maximum links attached to the extracted text
pub const MAX_LINKS: usize = 50;

/// Heading of the trailing links section
pub const LINKS_HEADER: &str = "\n\nAdditional links found on page:\n";

/// Elements dropped before text is measured
const NOISE_SELECTOR: &str = "script, style, nav, header, footer, aside, .nav, .menu, .sidebar, \
    .advertisement, .ad, .social, .comment, .hidden, [role=\"navigation\"], [role=\"banner\"], \
    [role=\"complementary\"]";

const PRIMARY_SELECTORS: &[&str] = &["main", "article"];

/// Common content containers, tried in order after <main> and <article>
const CONTENT_SELECTORS: &[&str] = &[
    ".content",
    ".post-content",
    ".article-content",
    ".entry-content",
    ".body-content",
    ".product-list",
    ".products",
    ".product-grid",
    ".shop-grid",
    ".product-item",
    ".product-card",
    "#content",
    ".main-content",
    ".items-grid",
];

/// Product cards whose title can name an image-only product link
const LINK_CARD_SELECTORS: &[&str] = &[
    ".product-item",
    ".product-card",
    "[class*=\"product-card\"]",
    "[class*=\"product-item\"]",
    ".product-block",
    ".product-col",
];

pub(crate) const PRODUCT_ANCHOR_SELECTOR: &str = "a[href*=\"/products/\"], a[href*=\"/product/\"]";

const CARD_TITLE_SELECTOR: &str = "h2, h3, .product-title, .product-name, \
    [class*=\"product-title\"], [class*=\"product-name\"]";

/// Longest anchor label kept in the links section
const MAX_LABEL_CHARS: usize = 200;

static PRODUCT_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)/products?/").expect("Invalid product path regex")
});

/// Whether a URL's path looks like a product page (`/product/` or `/products/`)
pub fn is_product_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => PRODUCT_PATH_RE.is_match(parsed.path()),
        Err(_) => false,
    }
}

/// Which flavour of extraction to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractMode {
    /// Denoised text only
    Content,
    /// Denoised text plus a prioritized list of page links
    ContentWithLinks,
}

impl ExtractMode {
    pub fn max_chars(self) -> usize {
        match self {
            ExtractMode::Content => MAX_CONTENT_CHARS,
            ExtractMode::ContentWithLinks => MAX_CONTENT_WITH_LINKS_CHARS,
        }
    }
}

/// A harvested link with its visible label
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub label: String,
    pub url: String,
}

/// Bounded, denoised text of a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PageText {
    pub plain_text: String,
    pub links: Vec<PageLink>,
    pub truncated: bool,
}

impl PageText {
    pub fn is_empty(&self) -> bool {
        self.plain_text.trim().is_empty() && self.links.is_empty()
    }

    /// Text handed to the prompt composer: content, then the links section if any
    pub fn to_prompt_text(&self) -> String {
        if self.links.is_empty() {
            return self.plain_text.clone();
        }
        let lines = self
            .links
            .iter()
            .map(|l| format!("{}: {}", l.label, l.url))
            .collect::<Vec<_>>()
            .join("\n");
        format!("{}{}{}", self.plain_text, LINKS_HEADER, lines)
    }

    /// Harvested links as a markdown bullet list with a total footer
    pub fn links_markdown(&self) -> String {
        if self.links.is_empty() {
            return "No links found".to_string();
        }
        let mut out = String::new();
        for link in &self.links {
            out.push_str(&format!("- [{}]({})\n", link.label.replace(']', "\\]"), link.url));
        }
        out.push_str(&format!("\n*(Total: {} links)*", self.links.len()));
        out
    }
}

/// Reads the current document through a [`BrowserEngine`].
///
/// Every failure (no document, script error, selector error, time bound
/// exceeded) degrades to an empty [`PageText`].
#[derive(Debug, Clone)]
pub struct PageTextExtractor {
    timeout: Duration,
}

impl Default for PageTextExtractor {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

impl PageTextExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn extract_content(&self, engine: &dyn BrowserEngine) -> PageText {
        self.extract(engine, ExtractMode::Content)
    }

    pub fn extract_content_with_links(&self, engine: &dyn BrowserEngine) -> PageText {
        self.extract(engine, ExtractMode::ContentWithLinks)
    }

    pub fn extract(&self, engine: &dyn BrowserEngine, mode: ExtractMode) -> PageText {
        let DomSnapshot { url, html } = match DomSnapshot::capture(engine) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "no page snapshot, extraction skipped");
                return PageText::default();
            }
        };

        let outcome = run_bounded(self.timeout, move || {
            extract_page_text(&html, &url, mode).map_err(|e| e.to_string())
        });

        match outcome {
            Some(Ok(text)) => {
                tracing::debug!(
                    chars = char_len(&text.plain_text),
                    links = text.links.len(),
                    truncated = text.truncated,
                    ?mode,
                    "extracted page text"
                );
                text
            }
            Some(Err(e)) => {
                tracing::warn!(error = %e, "page text extraction failed");
                PageText::default()
            }
            None => PageText::default(),
        }
    }
}

/// Extract bounded text (and optionally links) from raw HTML
pub fn extract_page_text(html: &str, page_url: &str, mode: ExtractMode) -> Result<PageText> {
    let document = Html::parse_document(html);
    let content = main_content_text(&document)?;
    let (plain_text, truncated) = truncate_with_marker(&content, mode.max_chars());

    let links = match mode {
        ExtractMode::Content => Vec::new(),
        ExtractMode::ContentWithLinks => {
            let base = document_base(&document, page_url)?;
            harvest_links(&document, &base)?
        }
    };

    Ok(PageText {
        plain_text,
        links,
        truncated,
    })
}

/// Walk the fallback cascade: <main>, <article>, content containers, then <body>.
///
/// Text is denoised and collapsed before it is measured, so a sparse <main>
/// never beats a richer container further down the list.
fn main_content_text(document: &Html) -> Result<String> {
    let noise = selector(NOISE_SELECTOR)?;

    for css in PRIMARY_SELECTORS.iter().chain(CONTENT_SELECTORS) {
        let sel = selector(css)?;
        if let Some(element) = document.select(&sel).next() {
            let text = denoised_text(element, &noise);
            if char_len(&text) >= MIN_CANDIDATE_CHARS {
                tracing::trace!(selector = *css, "content candidate accepted");
                return Ok(text);
            }
        }
    }

    let body = selector("body")?;
    Ok(document
        .select(&body)
        .next()
        .map(|el| denoised_text(el, &noise))
        .unwrap_or_default())
}

/// Text of `element` with noise subtrees skipped, whitespace collapsed
fn denoised_text(element: ElementRef, noise: &Selector) -> String {
    let mut parts = Vec::new();
    collect_text(element, noise, &mut parts);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text<'a>(element: ElementRef<'a>, noise: &Selector, parts: &mut Vec<&'a str>) {
    for child in element.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            if !noise.matches(&child_el) {
                collect_text(child_el, noise, parts);
            }
        } else if let Some(text) = child.value().as_text() {
            parts.push(&**text);
        }
    }
}

fn usable_label(label: &str) -> bool {
    let len = char_len(label);
    len > 0 && len < MAX_LABEL_CHARS
}

fn skip_href(raw: &str) -> bool {
    let lower = raw.to_ascii_lowercase();
    raw.is_empty() || lower.starts_with("javascript:") || lower.starts_with("mailto:") || raw.starts_with('#')
}

/// Collect `(label, absolute url)` pairs, product links first, capped at [`MAX_LINKS`]
fn harvest_links(document: &Html, base: &Url) -> Result<Vec<PageLink>> {
    let product_anchor = selector(PRODUCT_ANCHOR_SELECTOR)?;
    let card_title = selector(CARD_TITLE_SELECTOR)?;
    let all_anchors = selector("a[href]")?;

    let mut product_links = Vec::new();
    let mut other_links = Vec::new();
    let mut seen_product: HashSet<String> = HashSet::new();
    let mut seen: HashSet<String> = HashSet::new();

    // Card pass first so image-only product links still get a name
    for css in LINK_CARD_SELECTORS {
        let card_selector = selector(css)?;
        for card in document.select(&card_selector) {
            let Some(anchor) = card.select(&product_anchor).next() else {
                continue;
            };
            let Some(url) = anchor.value().attr("href").and_then(|raw| resolve_href(base, raw)) else {
                continue;
            };
            if seen_product.contains(&url) {
                continue;
            }

            let title = card
                .select(&card_title)
                .next()
                .map(|t| collapse_whitespace(&element_text(t)))
                .filter(|t| !t.is_empty());
            let label = title.unwrap_or_else(|| collapse_whitespace(&element_text(anchor)));

            if usable_label(&label) {
                seen_product.insert(url.clone());
                product_links.push(PageLink { label, url });
            }
        }
    }

    for anchor in document.select(&all_anchors) {
        let raw = anchor.value().attr("href").unwrap_or_default().trim();
        if skip_href(raw) {
            continue;
        }
        let Some(url) = resolve_href(base, raw) else {
            continue;
        };
        if seen.contains(&url) {
            continue;
        }
        let label = collapse_whitespace(&element_text(anchor));
        if !usable_label(&label) {
            continue;
        }
        seen.insert(url.clone());

        if is_product_url(&url) {
            if seen_product.insert(url.clone()) {
                product_links.push(PageLink { label, url });
            }
        } else {
            other_links.push(PageLink { label, url });
        }
    }

    Ok(product_links
        .into_iter()
        .chain(other_links)
        .take(MAX_LINKS)
        .collect())
}
