use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PagemateError, Result};

/// Models offered by `pagemate config show`
pub const AVAILABLE_MODELS: &[&str] = &[
    "gpt-4o-mini",
    "gpt-4o",
    "gpt-3.5-turbo",
    "claude-3-haiku",
    "claude-3-sonnet",
    "gemini-pro",
];

/// Global pagemate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of an OpenAI-compatible API (e.g. a LiteLLM proxy)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Bearer token for the chat endpoint
    #[serde(default)]
    pub api_key: String,

    /// Model name sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// Language every answer is requested in
    #[serde(default = "default_language")]
    pub language: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Overall timeout for a chat request, in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Upper bound for one extraction pass, in milliseconds
    #[serde(default = "default_extraction_timeout")]
    pub extraction_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "https://api.litellm.ai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_language() -> String {
    crate::prompt::DEFAULT_LANGUAGE.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_request_timeout() -> u64 {
    60
}

fn default_extraction_timeout() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            model: default_model(),
            language: default_language(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
            extraction_timeout_ms: default_extraction_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// `PAGEMATE_API_KEY` overrides the stored key when set.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        if let Ok(key) = std::env::var("PAGEMATE_API_KEY") {
            if !key.trim().is_empty() {
                config.api_key = key;
            }
        }
        Ok(config)
    }

    /// Load configuration from an explicit path, falling back to defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PagemateError::ConfigError(e.to_string()))?;
        std::fs::write(path, content)?;
        tracing::info!(path = %path.display(), "configuration saved");
        Ok(())
    }

    /// Get the config file path
    ///
    /// Supports PAGEMATE_CONFIG environment variable for test isolation
    pub fn config_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("PAGEMATE_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = ProjectDirs::from("", "", "pagemate")
            .ok_or_else(|| PagemateError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// A key is all that's needed to talk to the endpoint
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Error to surface when no key is configured
    pub fn not_configured_error(&self) -> PagemateError {
        let path = Self::config_path().unwrap_or_else(|_| PathBuf::from("config.toml"));
        PagemateError::NotConfigured { path }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn extraction_timeout(&self) -> Duration {
        Duration::from_millis(self.extraction_timeout_ms)
    }

    /// API key with everything but the last four characters masked
    pub fn masked_api_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            return "(not set)".to_string();
        }
        let visible: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
        format!("****{}", visible)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.endpoint, "https://api.litellm.ai");
        assert_eq!(config.model, "gpt-4o-mini");
        assert!(!config.is_configured());
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_blank_key_is_not_configured() {
        let config = Config {
            api_key: "   ".into(),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(r#"api_key = "sk-test""#).unwrap();
        assert!(config.is_configured());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.extraction_timeout_ms, 5000);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config {
            api_key: "sk-abcdef".into(),
            model: "gpt-4o".into(),
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.api_key, "sk-abcdef");
        assert_eq!(loaded.model, "gpt-4o");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert!(!loaded.is_configured());
    }

    #[test]
    fn test_masked_api_key() {
        let config = Config {
            api_key: "sk-1234567890".into(),
            ..Default::default()
        };
        assert_eq!(config.masked_api_key(), "****7890");
        assert_eq!(Config::default().masked_api_key(), "(not set)");
    }
}
