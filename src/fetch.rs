use std::time::Duration;

use once_cell::sync::Lazy;
use ureq::ResponseExt;

use crate::error::{PagemateError, Result};
use crate::page::StaticPage;

/// Default HTTP request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; pagemate/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Shared HTTP agent for connection pooling
static HTTP_AGENT: Lazy<ureq::Agent> = Lazy::new(|| {
    ureq::Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
        .build()
        .into()
});

/// Add `https://` to bare hosts typed on the command line
pub fn normalize_input_url(input: &str) -> Result<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PagemateError::ConfigError("URL is empty".into()));
    }
    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let parsed = url::Url::parse(&candidate)?;
    Ok(parsed.to_string())
}

/// Fetch a page over HTTP so the extractors can read it.
///
/// The page keeps its final URL after redirects, which is what relative
/// links resolve against.
pub fn fetch_page(url: &str) -> Result<StaticPage> {
    let url = normalize_input_url(url)?;
    tracing::info!(%url, "fetching page");

    let response = HTTP_AGENT
        .get(&url)
        .header("User-Agent", USER_AGENT)
        .header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .call()?;

    let final_url = response.get_uri().to_string();
    let html = response.into_body().read_to_string()?;
    tracing::debug!(url = %final_url, bytes = html.len(), "page fetched");

    Ok(StaticPage::new(final_url, html))
}

/// Read a saved HTML file, treating it as if it were served from `url`
pub fn load_page(path: &std::path::Path, url: &str) -> Result<StaticPage> {
    let html = std::fs::read_to_string(path)?;
    Ok(StaticPage::new(normalize_input_url(url)?, html))
}
