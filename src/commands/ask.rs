//! One-shot questions and the interactive chat

use colored::Colorize;
use inquire::Text;

use pagemate::cli::PageArgs;
use pagemate::companion::Companion;
use pagemate::config::Config;
use pagemate::page::{BrowserEngine, StaticPage};
use pagemate::prompt::PromptType;
use pagemate::session::{ConversationEntry, Session, Speaker};
use pagemate::{PagemateError, Result};

use crate::utils::{open_page, print_entry, print_products, report_error};

/// Ask a single question about a page
pub fn cmd_ask(page: PageArgs, question: Option<String>, intent: PromptType, json: bool) -> Result<()> {
    let config = Config::load()?;
    if !config.is_configured() {
        return Err(config.not_configured_error());
    }

    let question = question.unwrap_or_default();
    if intent == PromptType::Question && question.trim().is_empty() {
        return Err(PagemateError::ConfigError(
            "A question is required unless --intent is given".into(),
        ));
    }

    let engine = open_page(&page)?;
    let mut companion = Companion::new(config);
    let answer = companion.ask(&engine, &question, intent)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
    } else {
        print_latest_turn(companion.session());
    }
    Ok(())
}

/// A line typed into the chat
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatInput {
    Ask(PromptType, String),
    Links,
    Products,
    Open(String),
    Copy,
    Reset,
    Help,
    Quit,
}

fn parse_chat_input(input: &str) -> ChatInput {
    let input = input.trim();
    let Some(command) = input.strip_prefix('/') else {
        return ChatInput::Ask(PromptType::Question, input.to_string());
    };

    let (name, rest) = match command.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim().to_string()),
        None => (command, String::new()),
    };

    match name.to_lowercase().as_str() {
        "summarize" | "summary" => ChatInput::Ask(PromptType::Summarize, rest),
        "read" | "reading" => ChatInput::Ask(PromptType::ReadingMode, rest),
        "contact" | "contacts" => ChatInput::Ask(PromptType::ExtractContact, rest),
        "choose" => ChatInput::Ask(PromptType::HelpChooseProduct, rest),
        "advice" => ChatInput::Ask(PromptType::PurchaseAdvice, rest),
        "translate" => {
            let question = if rest.is_empty() {
                rest
            } else {
                format!("Translate to {}", rest)
            };
            ChatInput::Ask(PromptType::Translate, question)
        }
        "links" => ChatInput::Links,
        "products" => ChatInput::Products,
        "open" if !rest.is_empty() => ChatInput::Open(rest),
        "copy" | "transcript" => ChatInput::Copy,
        "reset" | "clear" => ChatInput::Reset,
        "quit" | "exit" | "q" => ChatInput::Quit,
        _ => ChatInput::Help,
    }
}

fn print_chat_help() {
    println!("{}", "Type a question, or one of:".dimmed());
    for (command, description) in [
        ("/summarize", "summarize the page"),
        ("/read", "reading mode"),
        ("/contact", "contact information"),
        ("/links", "list links (no AI call)"),
        ("/products", "product cards (no AI call)"),
        ("/choose [context]", "help choosing a product"),
        ("/advice [context]", "purchase advice"),
        ("/translate <lang>", "translate the page"),
        ("/open <url>", "switch page"),
        ("/copy", "print the transcript"),
        ("/reset", "clear the conversation"),
        ("/quit", "leave"),
    ] {
        println!("  {:<20} {}", command.cyan(), description);
    }
}

fn print_page_header(engine: &StaticPage) {
    let title = engine.current_title().unwrap_or_else(|| "(untitled)".to_string());
    println!("\n{} {}", "Page:".bold(), title);
    println!("      {}\n", engine.url.dimmed());
}

/// Entries added since the user's last line
fn print_latest_turn(session: &Session) {
    let entries: Vec<&ConversationEntry> = session.entries().collect();
    let start = entries
        .iter()
        .rposition(|e| matches!(e, ConversationEntry::Text { speaker: Speaker::User, .. }))
        .map(|i| i + 1)
        .unwrap_or(0);
    for entry in &entries[start..] {
        print_entry(entry);
    }
}

/// Interactive conversation about a page
pub fn cmd_chat(page: PageArgs) -> Result<()> {
    let config = Config::load()?;
    let mut engine = open_page(&page)?;
    let mut companion = Companion::new(config);

    print_page_header(&engine);
    if !companion.config().is_configured() {
        report_error(&companion.config().not_configured_error());
        println!("{}", "Only /links, /products and /copy work until a key is set.\n".yellow());
    }
    print_chat_help();

    loop {
        if let Some(status) = companion.poll_idle() {
            println!("{}", status.message().yellow());
        }

        let Ok(line) = Text::new("›").prompt() else {
            break;
        };
        // The prompt may have sat open past the idle deadline
        if let Some(status) = companion.poll_idle() {
            println!("{}", status.message().yellow());
        }
        if line.trim().is_empty() {
            continue;
        }
        companion.touch();

        match parse_chat_input(&line) {
            ChatInput::Quit => break,
            ChatInput::Help => print_chat_help(),
            ChatInput::Reset => {
                let status = companion.reset_session();
                println!("{}", status.message().yellow());
            }
            ChatInput::Copy => {
                let transcript = companion.session().transcript();
                if transcript.is_empty() {
                    println!("{}", "Nothing to copy yet.".dimmed());
                } else {
                    println!("{}", transcript);
                }
            }
            ChatInput::Links => {
                let text = companion.list_links(&engine);
                println!("\n{}\n", text.links_markdown());
            }
            ChatInput::Products => {
                let products = companion.list_products(&engine);
                if products.is_empty() {
                    println!("{}", "No products found on this page.".dimmed());
                } else {
                    print_products(&products);
                }
            }
            ChatInput::Open(url) => match open_page(&PageArgs { url, html: None }) {
                Ok(next) => {
                    engine = next;
                    print_page_header(&engine);
                }
                Err(e) => report_error(&e),
            },
            ChatInput::Ask(intent, question) => {
                if intent == PromptType::Question && question.is_empty() {
                    continue;
                }
                println!("{}", "Thinking...".dimmed());
                match companion.ask(&engine, &question, intent) {
                    Ok(_) => print_latest_turn(companion.session()),
                    Err(e) => report_error(&e),
                }
            }
        }
    }

    Ok(())
}
