use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::prompt::PromptType;

/// Shell types for completion generation
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

#[derive(Parser)]
#[command(name = "pagemate")]
#[command(author, version, about = "A browsing companion that answers questions about any web page", long_about = None)]
#[command(after_help = r#"Examples:
  pagemate ask https://shop.example/collections/all "Which jacket is cheapest?"
  pagemate ask https://blog.example/post --intent summarize
  pagemate chat https://shop.example/products/boot          Interactive conversation
  pagemate extract https://blog.example/post --links        What the model will see
  pagemate products https://shop.example/collections/all    Product cards on a page

Quick Start:
  1. pagemate config set --api-key <key> --endpoint https://api.litellm.ai
  2. pagemate chat https://example.com
"#)]
pub struct Cli {
    /// Increase log output (-v info, -vv debug, -vvv trace). PAGEMATE_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// The page a command works on
#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    /// Page URL (https:// is assumed when omitted)
    pub url: String,

    /// Read the page from a saved HTML file instead of fetching it; URL is used as its address
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask one question about a page
    #[command(after_help = r#"Examples:
  pagemate ask https://shop.example/collections/all "Link to the cheapest shirt?"
  pagemate ask https://shop.example/collections/all --intent choose "budget 500k"
  pagemate ask https://news.example/article --intent translate "Translate to French"
  pagemate ask https://news.example/article --intent reading-mode
  pagemate ask https://shop.example/products/boot --intent advice --json
"#)]
    Ask {
        #[command(flatten)]
        page: PageArgs,

        /// Question or context (optional for intents other than question)
        question: Option<String>,

        /// What to do with the page
        #[arg(long, short, value_enum, default_value = "question")]
        intent: PromptType,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Chat about a page interactively
    #[command(after_help = r#"Commands inside the chat:
  /summarize            Summarize the page
  /read                 Reading mode (clean main text)
  /contact              Contact information on the page
  /links                List the page's links (no AI call)
  /products             Show product cards (no AI call)
  /choose [context]     Help choosing a product
  /advice [context]     Purchase advice
  /translate <lang>     Translate the page
  /open <url>           Switch to another page
  /copy                 Print the conversation transcript
  /reset                Clear the conversation
  /quit                 Leave
"#)]
    Chat {
        #[command(flatten)]
        page: PageArgs,
    },

    /// Show the text extracted from a page
    Extract {
        #[command(flatten)]
        page: PageArgs,

        /// Include harvested links (the larger budget used for questions)
        #[arg(long)]
        links: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List product cards found on a page
    Products {
        #[command(flatten)]
        page: PageArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List links found on a page
    Links {
        #[command(flatten)]
        page: PageArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View or change configuration
    #[command(subcommand, after_help = r#"Examples:
  pagemate config show
  pagemate config set --api-key sk-... --model gpt-4o
  pagemate config set --language English
  pagemate config path
"#)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show {
        /// Output as JSON (API key masked)
        #[arg(long)]
        json: bool,
    },

    /// Print the config file path
    Path,

    /// Update configuration values
    Set {
        /// Base URL of the OpenAI-compatible API
        #[arg(long)]
        endpoint: Option<String>,

        /// API key (prompted for when no flag is given)
        #[arg(long)]
        api_key: Option<String>,

        /// Model name
        #[arg(long)]
        model: Option<String>,

        /// Language answers are written in
        #[arg(long)]
        language: Option<String>,

        /// Sampling temperature (0.0 - 2.0)
        #[arg(long)]
        temperature: Option<f64>,
    },
}
