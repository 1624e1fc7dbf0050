//! Product cards from listing and detail pages
//!
//! Heuristics emit one packed line per product (`title\turl\timage\tprice[\tcta]`)
//! which is then parsed back into [`ProductRecord`]s. Every field is cleaned of
//! tabs and newlines before packing, so the line format never breaks.

use std::collections::HashSet;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::correlate::normalize_url_for_match;
use crate::error::Result;
use crate::extract::{is_product_url, PRODUCT_ANCHOR_SELECTOR};
use crate::normalize::{clean_field, take_chars};
use crate::page::{document_base, element_text, resolve_href, run_bounded, selector, BrowserEngine, DomSnapshot};

/// Most products returned for one page
pub const MAX_PRODUCTS: usize = 20;

/// Title used when a card has no readable name
pub const FALLBACK_TITLE: &str = "Product";

/// Title cap for products found by the generic anchor pass
const MAX_GENERIC_TITLE_CHARS: usize = 200;

const DETAIL_CONTAINER_SELECTOR: &str = ".product-detail, .product-single, [class*=\"product-detail\"], \
    [class*=\"product-single\"], .product, main, article";
const DETAIL_TITLE_SELECTOR: &str = "h1, .product-title, .product-name, [class*=\"product-title\"]";
const DETAIL_CTA_SELECTOR: &str = "form[action*=\"cart\"] button[type=\"submit\"], form[action*=\"cart\"] button[name=\"add\"], \
    button[name=\"add\"], .add-to-cart, .btn-add-to-cart, [class*=\"add-to-cart\"]";
const BUTTON_LIKE_SELECTOR: &str = "button, [role=\"button\"], input[type=\"submit\"]";

/// Button captions that mean "put this in the cart", matched case-insensitively
/// Shown on a product card when the page had no recognizable cart button
pub const DEFAULT_CALL_TO_ACTION: &str = "Thêm vào giỏ";

const CTA_PHRASES: &[&str] = &["add to cart", "add to bag", "buy now", "thêm vào giỏ", "mua ngay"];

const CARD_SELECTORS: &[&str] = &[
    ".product-item",
    ".product-card",
    "[class*=\"product-card\"]",
    "[class*=\"product-item\"]",
    ".product-block",
    ".product-col",
    ".product",
    ".grid-product",
    "[class*=\"product\"]",
];
const CARD_TITLE_SELECTOR: &str = "h2, h3, h4, .product-title, .product-name, \
    [class*=\"product-title\"], [class*=\"product-name\"]";
const PRICE_SELECTOR: &str = ".price, .product-price, .amount, [class*=\"price\"], .current_price, .sale-price";
const GENERIC_PRICE_SELECTOR: &str = ".price, .product-price, .amount, [class*=\"price\"]";

/// Image attributes tried in order before falling back to a srcset
const IMAGE_ATTRS: &[&str] = &["src", "data-src", "data-lazy-src", "data-original"];

/// A product shown on the current page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub title: String,
    /// Absolute product URL; never blank
    pub url: String,
    /// Absolute image URL, or empty
    #[serde(default)]
    pub image_url: String,
    /// Price as printed on the page
    #[serde(default)]
    pub price: String,
    /// Add-to-cart caption, detail pages only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_to_action: Option<String>,
}

impl ProductRecord {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        image_url: impl Into<String>,
        price: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            image_url: image_url.into(),
            price: price.into(),
            call_to_action: None,
        }
    }

    pub fn with_call_to_action(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.call_to_action = if label.trim().is_empty() { None } else { Some(label) };
        self
    }

    /// The page's own cart-button caption, else [`DEFAULT_CALL_TO_ACTION`]
    pub fn call_to_action_label(&self) -> &str {
        self.call_to_action.as_deref().unwrap_or(DEFAULT_CALL_TO_ACTION)
    }

    /// Identity key used for matching
    pub fn key(&self) -> String {
        normalize_url_for_match(&self.url)
    }
}

/// Serialize a record into its packed line form
pub fn pack_record(record: &ProductRecord) -> String {
    let mut fields = vec![
        record.title.as_str(),
        record.url.as_str(),
        record.image_url.as_str(),
        record.price.as_str(),
    ];
    if let Some(cta) = record.call_to_action.as_deref() {
        fields.push(cta);
    }
    fields.join("\t")
}

/// Parse packed product lines.
///
/// Missing trailing fields become empty; lines without a URL are dropped.
pub fn parse_product_lines(raw: &str) -> Vec<ProductRecord> {
    raw.lines()
        .map(|line| line.trim_end_matches(['\r', '\n']))
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let mut parts = line.split('\t').map(str::trim);
            let title = parts.next().unwrap_or_default();
            let url = parts.next().unwrap_or_default();
            let image_url = parts.next().unwrap_or_default();
            let price = parts.next().unwrap_or_default();
            let cta = parts.next().unwrap_or_default();
            if url.is_empty() {
                return None;
            }
            Some(ProductRecord::new(title, url, image_url, price).with_call_to_action(cta))
        })
        .collect()
}

/// Render products as the prompt enrichment block
pub fn catalog_section(products: &[ProductRecord]) -> String {
    if products.is_empty() {
        return String::new();
    }
    let mut out = String::from("\n\nProducts on page (title | URL | price):\n");
    for product in products {
        out.push_str(&format!("{} | {} | {}", product.title, product.url, product.price));
        if let Some(cta) = &product.call_to_action {
            out.push_str(&format!(" | Add to cart: {}", cta));
        }
        out.push('\n');
    }
    out
}

/// Reads product cards through a [`BrowserEngine`]
#[derive(Debug, Clone)]
pub struct ProductCatalogExtractor {
    timeout: Duration,
}

impl Default for ProductCatalogExtractor {
    fn default() -> Self {
        Self::new(Duration::from_millis(5000))
    }
}

impl ProductCatalogExtractor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Up to [`MAX_PRODUCTS`] products, most relevant first. Empty on any failure.
    pub fn extract_products(&self, engine: &dyn BrowserEngine) -> Vec<ProductRecord> {
        let DomSnapshot { url, html } = match DomSnapshot::capture(engine) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::debug!(error = %e, "no page snapshot, product extraction skipped");
                return Vec::new();
            }
        };

        let products = run_bounded(self.timeout, move || extract_products_from_html(&html, &url)).unwrap_or_default();
        tracing::debug!(count = products.len(), "extracted products");
        products
    }
}

/// Product extraction over raw markup: detail mode first, then listing mode
pub fn extract_products_from_html(html: &str, page_url: &str) -> Vec<ProductRecord> {
    let document = Html::parse_document(html);

    if is_product_url(page_url) {
        match detail_lines(&document, page_url) {
            Ok(lines) => {
                let products = parse_product_lines(&lines.join("\n"));
                if !products.is_empty() {
                    return products;
                }
            }
            Err(e) => tracing::debug!(error = %e, "product detail extraction failed, trying listing"),
        }
    }

    match listing_lines(&document, page_url) {
        Ok(lines) => parse_product_lines(&lines.join("\n")),
        Err(e) => {
            tracing::warn!(error = %e, "product listing extraction failed");
            Vec::new()
        }
    }
}

fn pack_fields(title: &str, url: &str, image_url: &str, price: &str, cta: Option<&str>) -> String {
    let mut line = format!("{}\t{}\t{}\t{}", title, url, image_url, price);
    if let Some(cta) = cta {
        line.push('\t');
        line.push_str(cta);
    }
    line
}

fn first_text(scope: ElementRef, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(|el| clean_field(&element_text(el)))
}

fn titled(title: String) -> String {
    if title.is_empty() {
        FALLBACK_TITLE.to_string()
    } else {
        title
    }
}

/// Single record for a product detail page, keyed by the page's own URL
fn detail_lines(document: &Html, page_url: &str) -> Result<Vec<String>> {
    let base = document_base(document, page_url)?;
    let root = document.root_element();
    let body = selector("body")?;

    let container = document
        .select(&selector(DETAIL_CONTAINER_SELECTOR)?)
        .next()
        .or_else(|| document.select(&body).next())
        .unwrap_or(root);

    let title = match first_text(container, &selector(DETAIL_TITLE_SELECTOR)?) {
        Some(t) => t,
        None => first_text(root, &selector("h1")?).unwrap_or_default(),
    };
    let price = first_text(container, &selector(PRICE_SELECTOR)?).unwrap_or_default();
    let image_url = container
        .select(&selector("img[src]")?)
        .next()
        .and_then(|img| {
            let value = img.value();
            value.attr("src").filter(|s| !s.trim().is_empty()).or_else(|| value.attr("data-src"))
        })
        .and_then(|raw| resolve_href(&base, raw))
        .unwrap_or_default();
    let cta = call_to_action(container)?;

    Ok(vec![pack_fields(
        &titled(title),
        base.as_str(),
        &image_url,
        &price,
        cta.as_deref(),
    )])
}

fn button_caption(el: ElementRef) -> String {
    let text = element_text(el);
    if text.trim().is_empty() {
        el.value().attr("value").unwrap_or_default().to_string()
    } else {
        text
    }
}

fn call_to_action(container: ElementRef) -> Result<Option<String>> {
    let known = container.select(&selector(DETAIL_CTA_SELECTOR)?).next();
    let button = match known {
        Some(b) => Some(b),
        None => container.select(&selector(BUTTON_LIKE_SELECTOR)?).find(|b| {
            let caption = button_caption(*b).to_lowercase();
            CTA_PHRASES.iter().any(|phrase| caption.contains(phrase))
        }),
    };
    Ok(button.map(|b| clean_field(&button_caption(b))).filter(|c| !c.is_empty()))
}

fn image_url(scope: ElementRef, img_selector: &Selector, base: &Url) -> String {
    let Some(img) = scope.select(img_selector).next() else {
        return String::new();
    };
    let value = img.value();
    if let Some(raw) = IMAGE_ATTRS.iter().filter_map(|a| value.attr(a)).find(|v| !v.trim().is_empty()) {
        return resolve_href(base, raw).unwrap_or_default();
    }
    value
        .attr("data-srcset")
        .or_else(|| value.attr("srcset"))
        .and_then(|set| set.split(',').next())
        .and_then(|entry| entry.split_whitespace().next())
        .and_then(|candidate| resolve_href(base, candidate))
        .unwrap_or_default()
}

/// Cards on a listing page, falling back to bare product anchors
fn listing_lines(document: &Html, page_url: &str) -> Result<Vec<String>> {
    let base = document_base(document, page_url)?;
    let product_anchor = selector(PRODUCT_ANCHOR_SELECTOR)?;
    let card_title = selector(CARD_TITLE_SELECTOR)?;
    let price_selector = selector(PRICE_SELECTOR)?;
    let img = selector("img")?;

    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for css in CARD_SELECTORS {
        if out.len() >= MAX_PRODUCTS {
            break;
        }
        let card_selector = selector(css)?;
        for card in document.select(&card_selector) {
            if out.len() >= MAX_PRODUCTS {
                break;
            }
            let Some(anchor) = card.select(&product_anchor).next() else {
                continue;
            };
            let Some(href) = anchor.value().attr("href").and_then(|raw| resolve_href(&base, raw)) else {
                continue;
            };
            if !seen.insert(href.clone()) {
                continue;
            }

            let title = match card.select(&card_title).next() {
                Some(t) => clean_field(&element_text(t)),
                None => clean_field(&element_text(anchor)),
            };
            let price = first_text(card, &price_selector).unwrap_or_default();
            out.push(pack_fields(&titled(title), &href, &image_url(card, &img, &base), &price, None));
        }
    }

    if out.is_empty() {
        out = generic_lines(document, &base, &mut seen)?;
    }
    tracing::trace!(count = out.len(), "listing lines");
    Ok(out)
}

fn generic_lines(document: &Html, base: &Url, seen: &mut HashSet<String>) -> Result<Vec<String>> {
    let product_anchor = selector(PRODUCT_ANCHOR_SELECTOR)?;
    let heading = selector("h2, h3, h4")?;
    let price_selector = selector(GENERIC_PRICE_SELECTOR)?;
    let img = selector("img")?;

    let mut out = Vec::new();
    for anchor in document.select(&product_anchor) {
        if out.len() >= MAX_PRODUCTS {
            break;
        }
        let Some(href) = anchor.value().attr("href").and_then(|raw| resolve_href(base, raw)) else {
            continue;
        };
        if seen.contains(&href) {
            continue;
        }
        let Some(scope) = enclosing_block(anchor) else {
            continue;
        };
        seen.insert(href.clone());

        let mut title = clean_field(&element_text(anchor));
        if title.is_empty() {
            title = first_text(scope, &heading).unwrap_or_default();
        }
        let title = take_chars(&titled(title), MAX_GENERIC_TITLE_CHARS);
        let price = first_text(scope, &price_selector).unwrap_or_default();
        out.push(pack_fields(&title, &href, &image_url(scope, &img, base), &price, None));
    }
    Ok(out)
}

/// Nearest div/li/article/section ancestor, else the parent element
fn enclosing_block(anchor: ElementRef) -> Option<ElementRef> {
    let mut ancestors = anchor.ancestors().filter_map(ElementRef::wrap);
    let parent = anchor.parent().and_then(ElementRef::wrap);
    ancestors
        .find(|el| matches!(el.value().name(), "div" | "li" | "article" | "section"))
        .or(parent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    const LISTING: &str = r#"<html><body>
        <div class="collection">
            <div class="product-item">
                <a href="/products/linen-shirt"><img data-src="/img/linen.jpg"></a>
                <h3 class="product-title">  Linen
                    Shirt </h3>
                <span class="price">450.000₫</span>
            </div>
            <div class="product-item">
                <a href="/products/wool-coat"><img srcset="/img/coat-400.jpg 400w, /img/coat-800.jpg 800w"></a>
                <h3>Wool Coat</h3>
                <span class="product-price">1.200.000₫</span>
            </div>
            <div class="product-item">
                <a href="/products/linen-shirt">Duplicate</a>
            </div>
            <div class="product-item"><a href="/pages/about">Not a product</a></div>
        </div>
    </body></html>"#;

    #[test]
    fn test_listing_cards() {
        let products = extract_products_from_html(LISTING, "https://shop.test/collections/all");
        assert_eq!(products.len(), 2);
        assert_eq!(
            products[0],
            ProductRecord::new(
                "Linen Shirt",
                "https://shop.test/products/linen-shirt",
                "https://shop.test/img/linen.jpg",
                "450.000₫"
            )
        );
        assert_eq!(products[1].title, "Wool Coat");
        assert_eq!(products[1].image_url, "https://shop.test/img/coat-400.jpg");
        assert_eq!(products[1].price, "1.200.000₫");
    }

    #[test]
    fn test_listing_is_capped() {
        let mut html = String::from("<html><body>");
        for i in 0..30 {
            html.push_str(&format!(
                r#"<div class="product-card"><a href="/products/p{}">Item {}</a></div>"#,
                i, i
            ));
        }
        html.push_str("</body></html>");
        let products = extract_products_from_html(&html, "https://shop.test/");
        assert_eq!(products.len(), MAX_PRODUCTS);
        assert_eq!(products[0].title, "Item 0");
    }

    #[test]
    fn test_generic_anchor_fallback() {
        let html = r#"<html><body>
            <ul>
                <li><a href="/product/kettle"><img src="/k.png"></a><h4>Electric Kettle</h4><b class="price">$25</b></li>
                <li><a href="/product/toaster">Toaster</a></li>
            </ul>
        </body></html>"#;
        let products = extract_products_from_html(html, "https://shop.test/search?q=kitchen");
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].title, "Electric Kettle");
        assert_eq!(products[0].image_url, "https://shop.test/k.png");
        assert_eq!(products[0].price, "$25");
        assert_eq!(products[1].title, "Toaster");
        assert_eq!(products[1].image_url, "");
    }

    #[test]
    fn test_detail_page_with_cart_form() {
        let html = r#"<html><body>
            <h1>Site banner</h1>
            <div class="product-detail">
                <img src="/img/boot.jpg">
                <h1 class="product-title">Leather Boot</h1>
                <span class="sale-price">2.500.000₫</span>
                <form action="/cart/add"><button type="submit"> Thêm vào giỏ </button></form>
            </div>
        </body></html>"#;
        let products = extract_products_from_html(html, "https://shop.test/products/leather-boot");
        assert_eq!(products.len(), 1);
        let boot = &products[0];
        assert_eq!(boot.title, "Leather Boot");
        assert_eq!(boot.url, "https://shop.test/products/leather-boot");
        assert_eq!(boot.image_url, "https://shop.test/img/boot.jpg");
        assert_eq!(boot.price, "2.500.000₫");
        assert_eq!(boot.call_to_action.as_deref(), Some("Thêm vào giỏ"));
    }

    #[test]
    fn test_detail_page_cta_by_phrase() {
        let html = r#"<html><body><main>
            <h2>Desk</h2>
            <button>Share</button>
            <input type="submit" value="Buy Now">
        </main></body></html>"#;
        let products = extract_products_from_html(html, "https://shop.test/product/desk");
        assert_eq!(products[0].title, "Product");
        assert_eq!(products[0].call_to_action.as_deref(), Some("Buy Now"));
    }

    #[test]
    fn test_detail_title_falls_back_to_document_h1() {
        let html = r#"<html><body><h1>Standing Lamp</h1><article><p>Nice lamp</p></article></body></html>"#;
        let products = extract_products_from_html(html, "https://shop.test/products/lamp");
        assert_eq!(products[0].title, "Standing Lamp");
        assert_eq!(products[0].call_to_action, None);
    }

    #[test]
    fn test_pack_parse_round_trip() {
        let record = ProductRecord::new("Shoe", "https://shop.test/products/shoe", "https://shop.test/s.jpg", "$10")
            .with_call_to_action("Add to cart");
        assert_eq!(parse_product_lines(&pack_record(&record)), vec![record]);
    }

    #[test]
    fn test_call_to_action_label_defaults() {
        let plain = ProductRecord::new("Shoe", "https://shop.test/products/shoe", "", "");
        assert_eq!(plain.call_to_action_label(), DEFAULT_CALL_TO_ACTION);
        let blank = plain.clone().with_call_to_action("   ");
        assert_eq!(blank.call_to_action_label(), "Thêm vào giỏ");
        let own = plain.with_call_to_action("Buy now");
        assert_eq!(own.call_to_action_label(), "Buy now");
    }

    #[test]
    fn test_blank_title_keeps_its_column() {
        let record = ProductRecord::new("", "https://shop.test/products/a", "", "$5");
        let line = pack_record(&record);
        assert_eq!(line, "\thttps://shop.test/products/a\t\t$5");
        assert_eq!(parse_product_lines(&line), vec![record]);
        assert_eq!(
            parse_product_lines("  \thttps://shop.test/products/b\t\t$7\r\n"),
            vec![ProductRecord::new("", "https://shop.test/products/b", "", "$7")]
        );
    }

    #[test]
    fn test_parse_tolerates_missing_fields_and_blank_urls() {
        let raw = "Only title\n\nNo image\thttps://shop.test/products/a\r\n\t\t\t\nBlank url\t  \timg\t$1\n";
        let products = parse_product_lines(raw);
        assert_eq!(
            products,
            vec![ProductRecord::new("No image", "https://shop.test/products/a", "", "")]
        );
    }

    #[test]
    fn test_catalog_section() {
        let products = vec![
            ProductRecord::new("Shoe", "https://shop.test/products/shoe", "", "$10"),
            ProductRecord::new("Hat", "https://shop.test/products/hat", "", "").with_call_to_action("Buy now"),
        ];
        assert_eq!(
            catalog_section(&products),
            "\n\nProducts on page (title | URL | price):\n\
             Shoe | https://shop.test/products/shoe | $10\n\
             Hat | https://shop.test/products/hat |  | Add to cart: Buy now\n"
        );
        assert_eq!(catalog_section(&[]), "");
    }

    #[test]
    fn test_extractor_through_engine() {
        let extractor = ProductCatalogExtractor::default();
        let page = StaticPage::new("https://shop.test/collections/all", LISTING);
        assert_eq!(extractor.extract_products(&page).len(), 2);

        let blank = StaticPage::new("", LISTING);
        assert!(extractor.extract_products(&blank).is_empty());
    }
}
