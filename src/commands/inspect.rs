//! Look at what the extractors see, without calling the model

use colored::Colorize;

use pagemate::cli::PageArgs;
use pagemate::config::Config;
use pagemate::extract::{ExtractMode, PageTextExtractor};
use pagemate::normalize::char_len;
use pagemate::products::ProductCatalogExtractor;
use pagemate::Result;

use crate::utils::{open_page, print_products, truncate_display};

/// Print the denoised page text, optionally with its links section
pub fn cmd_extract(page: PageArgs, links: bool, json: bool) -> Result<()> {
    let config = Config::load()?;
    let engine = open_page(&page)?;
    let mode = if links {
        ExtractMode::ContentWithLinks
    } else {
        ExtractMode::Content
    };

    let text = PageTextExtractor::new(config.extraction_timeout()).extract(&engine, mode);

    if json {
        println!("{}", serde_json::to_string_pretty(&text)?);
        return Ok(());
    }

    if text.is_empty() {
        println!("{}", "No readable content found on this page.".yellow());
        return Ok(());
    }

    println!("{}", text.to_prompt_text());
    let truncated = if text.truncated { ", truncated" } else { "" };
    eprintln!(
        "\n{}",
        format!(
            "{} chars, {} links{}",
            char_len(&text.plain_text),
            text.links.len(),
            truncated
        )
        .dimmed()
    );
    Ok(())
}

/// Print the product cards found on a page
pub fn cmd_products(page: PageArgs, json: bool) -> Result<()> {
    let config = Config::load()?;
    let engine = open_page(&page)?;
    let products = ProductCatalogExtractor::new(config.extraction_timeout()).extract_products(&engine);

    if json {
        println!("{}", serde_json::to_string_pretty(&products)?);
        return Ok(());
    }

    if products.is_empty() {
        println!("{}", "No products found on this page.".yellow());
        return Ok(());
    }

    println!("\n{} ({})\n", "Products".bold(), products.len());
    print_products(&products);
    Ok(())
}

/// Print the links harvested from a page, product links first
pub fn cmd_links(page: PageArgs, json: bool) -> Result<()> {
    let config = Config::load()?;
    let engine = open_page(&page)?;
    let text = PageTextExtractor::new(config.extraction_timeout()).extract_content_with_links(&engine);

    if json {
        println!("{}", serde_json::to_string_pretty(&text.links)?);
        return Ok(());
    }

    if text.links.is_empty() {
        println!("{}", "No links found".yellow());
        return Ok(());
    }

    for link in &text.links {
        println!("  {}  {}", truncate_display(&link.label, 50).bold(), link.url.dimmed());
    }
    println!("\n  {}", format!("Total: {} links", text.links.len()).dimmed());
    Ok(())
}
