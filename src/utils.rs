//! Shared helpers for the command implementations

use colored::Colorize;

use pagemate::cli::PageArgs;
use pagemate::fetch::{fetch_page, load_page};
use pagemate::page::StaticPage;
use pagemate::products::ProductRecord;
use pagemate::session::{ConversationEntry, Speaker};
use pagemate::{PagemateError, Result};

/// Fetch the page, or read it from disk when `--html` was given
pub fn open_page(args: &PageArgs) -> Result<StaticPage> {
    match &args.html {
        Some(path) => load_page(path, &args.url),
        None => fetch_page(&args.url),
    }
}

/// Print an error and its hint to stderr
pub fn report_error(e: &PagemateError) {
    eprintln!("{} {}", "Error:".red().bold(), e);
    if let Some(hint) = e.hint() {
        eprintln!("\n{}", hint.dimmed());
    }
}

/// Truncate for display, on a char boundary
pub fn truncate_display(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

pub fn print_products(products: &[ProductRecord]) {
    for (i, product) in products.iter().enumerate() {
        let price = if product.price.is_empty() {
            String::new()
        } else {
            format!("  {}", product.price.green())
        };
        println!("  {}. {}{}", i + 1, truncate_display(&product.title, 70).bold(), price);
        println!("     {}", product.url.dimmed());
        if !product.image_url.is_empty() {
            println!("     {} {}", "image:".dimmed(), product.image_url.dimmed());
        }
        println!("     {} {}", "▸".cyan(), product.call_to_action_label());
    }
}

/// Render one conversation entry the way the chat shows it
pub fn print_entry(entry: &ConversationEntry) {
    match entry {
        ConversationEntry::Text { speaker, text } => match speaker {
            Speaker::User => println!("{} {}", "You:".bold(), text),
            Speaker::Assistant => println!("\n{}\n", text),
            Speaker::Notice => println!("{}", text.yellow()),
        },
        ConversationEntry::ProductCards { products } => {
            println!("{}", "Products".bold().underline());
            print_products(products);
            println!();
        }
        ConversationEntry::SuggestionButtons { suggestions } => {
            println!("{}", "Try asking:".dimmed());
            for suggestion in suggestions {
                println!("  {} {}", "•".dimmed(), suggestion);
            }
            println!();
        }
    }
}
