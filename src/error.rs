use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PagemateError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] ureq::Error),

    #[error("Chat endpoint returned HTTP {0}")]
    ChatStatus(u16),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("Extraction failed: {0}")]
    ExtractionError(String),

    #[error("Please configure your API key in:\n{}", path.display())]
    NotConfigured { path: PathBuf },

    #[error("A request is already in progress")]
    RequestInFlight,

    #[error("The chat request ended without a reply")]
    ReplyLost,

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl PagemateError {
    /// Get an actionable hint for how to resolve this error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            PagemateError::HttpError(_) => Some(
                "Check your internet connection and the configured endpoint:\n  pagemate config show"
            ),
            PagemateError::ChatStatus(401) | PagemateError::ChatStatus(403) => Some(
                "The endpoint rejected the API key. Update it with:\n  pagemate config set --api-key <key>"
            ),
            PagemateError::ChatStatus(404) => Some(
                "The endpoint has no /chat/completions route. Check it with:\n  pagemate config show"
            ),
            PagemateError::ChatStatus(_) => Some(
                "The chat endpoint failed. Wait a moment and ask again."
            ),
            PagemateError::NotConfigured { .. } => Some(
                "Set a key with: pagemate config set --api-key <key>\nOr export PAGEMATE_API_KEY"
            ),
            PagemateError::RequestInFlight => Some(
                "Wait for the current answer before asking again"
            ),
            PagemateError::ExtractionError(_) => Some(
                "Inspect what pagemate sees on the page with:\n  pagemate extract <url> --links"
            ),
            PagemateError::TomlError(_) => Some(
                "Fix or remove the config file shown by `pagemate config path`"
            ),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PagemateError>;
