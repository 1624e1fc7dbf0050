//! Configuration and shell completion commands

use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use inquire::Password;

use pagemate::cli::{Cli, CompletionShell};
use pagemate::config::{Config, AVAILABLE_MODELS};
use pagemate::{PagemateError, Result};

/// Show the current configuration
pub fn cmd_config_show(json: bool) -> Result<()> {
    let config = Config::load()?;
    let path = Config::config_path()?;

    if json {
        let value = serde_json::json!({
            "path": path.display().to_string(),
            "endpoint": config.endpoint,
            "api_key": config.masked_api_key(),
            "model": config.model,
            "language": config.language,
            "temperature": config.temperature,
            "request_timeout_secs": config.request_timeout_secs,
            "extraction_timeout_ms": config.extraction_timeout_ms,
            "configured": config.is_configured(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let status = if config.is_configured() {
        "configured".green()
    } else {
        "no API key".yellow()
    };

    println!("\n{} ({})\n", "Configuration".bold(), status);
    println!("  Endpoint:     {}", config.endpoint);
    println!("  API key:      {}", config.masked_api_key());
    println!("  Model:        {}", config.model);
    println!("  Language:     {}", config.language);
    println!("  Temperature:  {}", config.temperature);
    println!("  Timeouts:     {}s request, {}ms extraction", config.request_timeout_secs, config.extraction_timeout_ms);
    println!("\n  Models:       {}", AVAILABLE_MODELS.join(", ").dimmed());
    println!("  Config file:  {}", path.display());

    if !config.is_configured() {
        println!("\n  Run `pagemate config set --api-key <key>` to get started.");
    }
    Ok(())
}

pub fn cmd_config_path() -> Result<()> {
    println!("{}", Config::config_path()?.display());
    Ok(())
}

/// Update configuration values; prompts for the key when nothing was passed
pub fn cmd_config_set(
    endpoint: Option<String>,
    api_key: Option<String>,
    model: Option<String>,
    language: Option<String>,
    temperature: Option<f64>,
) -> Result<()> {
    let mut config = Config::load()?;
    let nothing_given = endpoint.is_none()
        && api_key.is_none()
        && model.is_none()
        && language.is_none()
        && temperature.is_none();

    let api_key = if nothing_given {
        let entered = Password::new("API key:")
            .without_confirmation()
            .prompt()
            .map_err(|e| PagemateError::ConfigError(e.to_string()))?;
        Some(entered)
    } else {
        api_key
    };

    if let Some(endpoint) = endpoint {
        let endpoint = endpoint.trim().to_string();
        if endpoint.is_empty() {
            return Err(PagemateError::ConfigError("Endpoint cannot be empty".into()));
        }
        config.endpoint = endpoint;
    }
    if let Some(key) = api_key {
        config.api_key = key.trim().to_string();
    }
    if let Some(model) = model {
        if !AVAILABLE_MODELS.contains(&model.as_str()) {
            println!(
                "  {} '{}' is not a listed model; saving it anyway.",
                "Note:".yellow(),
                model
            );
        }
        config.model = model;
    }
    if let Some(language) = language {
        config.language = language;
    }
    if let Some(temperature) = temperature {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(PagemateError::ConfigError(format!(
                "Temperature {} is out of range (0.0 - 2.0)",
                temperature
            )));
        }
        config.temperature = temperature;
    }

    config.save()?;
    println!("  {} Configuration saved to {}", "✓".green(), Config::config_path()?.display());
    Ok(())
}

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "pagemate", &mut io::stdout());
    Ok(())
}
