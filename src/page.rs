//! Browser-engine capability consumed by the extractors
//!
//! Extraction never touches a live DOM directly. It asks the engine to evaluate
//! a snapshot script, then runs its heuristics on the returned markup with
//! `scraper`. Anything that can answer [`DOCUMENT_HTML_SCRIPT`] can be read.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{PagemateError, Result};

/// Script returning the serialized document
pub const DOCUMENT_HTML_SCRIPT: &str = "document.documentElement.outerHTML";

/// Script returning the document title
pub const DOCUMENT_TITLE_SCRIPT: &str = "document.title";

/// What the companion needs from a browser
pub trait BrowserEngine {
    /// Evaluate a script against the current document.
    ///
    /// `Ok(None)` is the engine's `null`/`undefined`.
    fn evaluate(&self, script: &str) -> Result<Option<String>>;

    /// URL of the current document, if one is loaded
    fn current_url(&self) -> Option<String>;

    /// Title of the current document
    fn current_title(&self) -> Option<String>;
}

/// A document that has already been fetched.
///
/// Answers the snapshot scripts from its stored markup. Any other script
/// evaluates to `None`, as a page with no matching global would.
#[derive(Debug, Clone)]
pub struct StaticPage {
    pub url: String,
    pub title: Option<String>,
    pub html: String,
}

impl StaticPage {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        let html = html.into();
        let title = extract_title(&html);
        Self {
            url: url.into(),
            title,
            html,
        }
    }
}

impl BrowserEngine for StaticPage {
    fn evaluate(&self, script: &str) -> Result<Option<String>> {
        match script {
            DOCUMENT_HTML_SCRIPT => Ok(Some(self.html.clone())),
            DOCUMENT_TITLE_SCRIPT => Ok(self.title.clone()),
            _ => Ok(None),
        }
    }

    fn current_url(&self) -> Option<String> {
        Some(self.url.clone())
    }

    fn current_title(&self) -> Option<String> {
        self.title.clone()
    }
}

/// Markup and location captured from an engine in one go
#[derive(Debug, Clone)]
pub struct DomSnapshot {
    pub url: String,
    pub html: String,
}

impl DomSnapshot {
    /// Capture the current document. Fails when nothing is loaded or the
    /// snapshot script yields nothing.
    pub fn capture(engine: &dyn BrowserEngine) -> Result<Self> {
        let url = engine
            .current_url()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PagemateError::ExtractionError("no document loaded".into()))?;

        let html = engine
            .evaluate(DOCUMENT_HTML_SCRIPT)?
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| PagemateError::ExtractionError("snapshot script returned nothing".into()))?;

        Ok(Self { url, html })
    }
}

/// Parse a CSS selector, mapping failures into the crate error
pub fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| PagemateError::ExtractionError(format!("Invalid selector '{}': {:?}", css, e)))
}

/// Flattened text of an element, text nodes joined by spaces
pub fn element_text(element: scraper::ElementRef) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

/// Extract the page title from HTML
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|el| el.text().collect::<Vec<_>>().join("").trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Base URL of a document: `<base href>` resolved against the page URL, or the page URL itself
pub fn document_base(document: &Html, page_url: &str) -> Result<Url> {
    let page = Url::parse(page_url)?;
    let base_href = Selector::parse("base[href]")
        .ok()
        .and_then(|sel| {
            document
                .select(&sel)
                .next()
                .and_then(|el| el.value().attr("href").map(str::to_string))
        });

    match base_href {
        Some(href) => Ok(page.join(href.trim()).unwrap_or(page)),
        None => Ok(page),
    }
}

/// Resolve a raw href against the base. Returns `None` for anything that isn't http(s).
pub fn resolve_href(base: &Url, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let resolved = base.join(raw).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Run `work` on a worker thread and give up after `timeout`.
///
/// A timed-out worker is left to finish on its own; its result is discarded.
pub fn run_bounded<T, F>(timeout: Duration, work: F) -> Option<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(work());
    });

    match rx.recv_timeout(timeout) {
        Ok(value) => Some(value),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            tracing::warn!(timeout_ms = timeout.as_millis() as u64, "extraction exceeded its time bound");
            None
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            tracing::warn!("extraction worker exited without a result");
            None
        }
    }
}
