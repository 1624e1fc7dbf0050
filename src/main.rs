//! pagemate - a browsing companion that answers questions about any web page

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pagemate::cli::{Cli, Commands, ConfigCommands};
use pagemate::error::Result;

mod commands;
mod utils;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        utils::report_error(&e);
        std::process::exit(1);
    }
}

/// Log to stderr; `PAGEMATE_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("PAGEMATE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("pagemate={}", default_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Ask {
            page,
            question,
            intent,
            json,
        } => commands::cmd_ask(page, question, intent, json),
        Commands::Chat { page } => commands::cmd_chat(page),

        Commands::Extract { page, links, json } => commands::cmd_extract(page, links, json),
        Commands::Products { page, json } => commands::cmd_products(page, json),
        Commands::Links { page, json } => commands::cmd_links(page, json),

        Commands::Config(ConfigCommands::Show { json }) => commands::cmd_config_show(json),
        Commands::Config(ConfigCommands::Path) => commands::cmd_config_path(),
        Commands::Config(ConfigCommands::Set {
            endpoint,
            api_key,
            model,
            language,
            temperature,
        }) => commands::cmd_config_set(endpoint, api_key, model, language, temperature),

        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
