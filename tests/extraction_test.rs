//! Extraction against realistic page fixtures

use pagemate::extract::{ExtractMode, PageTextExtractor, MAX_LINKS};
use pagemate::page::StaticPage;
use pagemate::products::{catalog_section, ProductCatalogExtractor};

// ============================================================================
// Fixtures
// ============================================================================

const BLOG_POST: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Why Tea Beats Coffee - The Leaf Journal</title></head>
<body>
    <header><a href="/">The Leaf Journal</a><nav><a href="/archive">Archive</a><a href="/about">About</a></nav></header>
    <aside class="sidebar"><h3>Popular</h3><a href="/posts/green-tea">Green tea basics</a></aside>
    <main>
        <div class="advertisement">Buy our mugs!</div>
        <article>
            <h1>Why Tea Beats Coffee</h1>
            <p class="byline">By Linh Tran, March 2024</p>
            <p>Tea has been brewed for thousands of years. It offers a gentler lift than coffee,
               thanks to L-theanine, and comes in more varieties than any roaster could dream of.</p>
            <p>In this post we compare caffeine content, flavour range and cost per cup.</p>
            <div class="social"><a href="https://share.example/tw">Share</a></div>
        </article>
    </main>
    <footer>Contact: editor@leaf.example | <a href="mailto:editor@leaf.example">Email us</a></footer>
    <script>window.analytics = {};</script>
</body>
</html>
"#;

const COLLECTION: &str = r#"
<!DOCTYPE html>
<html>
<head><title>All Jackets - North Wind</title><base href="https://northwind.example/"></head>
<body>
    <nav class="menu"><a href="/collections/all">Shop</a><a href="/pages/contact">Contact</a></nav>
    <div class="product-grid">
        <div class="product-card">
            <a href="products/rain-shell"><img data-lazy-src="cdn/rain.jpg" alt=""></a>
            <div class="product-name">Rain Shell</div>
            <div class="price">1.490.000₫</div>
        </div>
        <div class="product-card">
            <a href="products/down-parka"><img data-original="cdn/parka.jpg" alt=""></a>
            <div class="product-name">Down Parka</div>
            <div class="price"><s>3.900.000₫</s> 2.900.000₫</div>
        </div>
        <div class="product-card">
            <a href="products/fleece">Fleece Jacket</a>
            <span class="amount">890.000₫</span>
        </div>
    </div>
    <footer><a href="/pages/shipping">Shipping policy</a></footer>
</body>
</html>
"#;

const PRODUCT_DETAIL: &str = r#"
<!DOCTYPE html>
<html>
<head><title>Rain Shell - North Wind</title></head>
<body>
    <header><h1>North Wind</h1></header>
    <section class="product-single">
        <div class="gallery"><img src="/cdn/rain-large.jpg"></div>
        <h1 class="product-single__title">Rain Shell</h1>
        <p class="product-single__price">1.490.000₫</p>
        <form action="/cart/add" method="post">
            <select name="id"><option>M</option></select>
            <button type="submit" name="add">Add to cart</button>
        </form>
    </section>
</body>
</html>
"#;

fn extractor() -> PageTextExtractor {
    PageTextExtractor::default()
}

// ============================================================================
// Page text
// ============================================================================

#[test]
fn test_blog_post_reads_article_only() {
    let page = StaticPage::new("https://leaf.example/posts/tea-vs-coffee", BLOG_POST);
    let text = extractor().extract_content(&page);

    assert!(text.plain_text.starts_with("Why Tea Beats Coffee By Linh Tran"));
    assert!(text.plain_text.contains("L-theanine"));
    assert!(!text.plain_text.contains("Buy our mugs"));
    assert!(!text.plain_text.contains("Share"));
    assert!(!text.plain_text.contains("Archive"));
    assert!(!text.plain_text.contains("analytics"));
    assert!(text.links.is_empty());
    assert!(!text.truncated);
}

#[test]
fn test_blog_post_links_skip_mailto() {
    let page = StaticPage::new("https://leaf.example/posts/tea-vs-coffee", BLOG_POST);
    let text = extractor().extract_content_with_links(&page);

    let urls: Vec<_> = text.links.iter().map(|l| l.url.as_str()).collect();
    assert!(urls.contains(&"https://leaf.example/archive"));
    assert!(urls.contains(&"https://share.example/tw"));
    assert!(!urls.iter().any(|u| u.starts_with("mailto:")));
    assert!(text.to_prompt_text().contains("\n\nAdditional links found on page:\nThe Leaf Journal: https://leaf.example/"));
}

#[test]
fn test_sparse_main_loses_to_long_article() {
    let article = "word ".repeat(100);
    let html = format!(
        "<html><body><main>{}</main><article>{}</article></body></html>",
        "m".repeat(40),
        article
    );
    let page = StaticPage::new("https://example.com/", html);
    let text = extractor().extract(&page, ExtractMode::Content);
    assert_eq!(text.plain_text, article.trim());
}

#[test]
fn test_collection_links_resolve_against_base_and_put_products_first() {
    let page = StaticPage::new("https://mirror.example/collections/jackets", COLLECTION);
    let text = extractor().extract_content_with_links(&page);

    assert!(text.links.len() <= MAX_LINKS);
    let first_three: Vec<_> = text.links.iter().take(3).map(|l| l.url.as_str()).collect();
    assert_eq!(
        first_three,
        vec![
            "https://northwind.example/products/rain-shell",
            "https://northwind.example/products/down-parka",
            "https://northwind.example/products/fleece",
        ]
    );
    assert_eq!(text.links[0].label, "Rain Shell");
    assert_eq!(text.links[3].url, "https://northwind.example/collections/all");
}

#[test]
fn test_no_document_means_empty_text() {
    let page = StaticPage::new("   ", BLOG_POST);
    assert!(extractor().extract_content_with_links(&page).is_empty());
}

// ============================================================================
// Products
// ============================================================================

#[test]
fn test_collection_products() {
    let page = StaticPage::new("https://mirror.example/collections/jackets", COLLECTION);
    let products = ProductCatalogExtractor::default().extract_products(&page);

    assert_eq!(products.len(), 3);
    assert_eq!(products[0].title, "Rain Shell");
    assert_eq!(products[0].image_url, "https://northwind.example/cdn/rain.jpg");
    assert_eq!(products[1].image_url, "https://northwind.example/cdn/parka.jpg");
    assert_eq!(products[1].price, "3.900.000₫ 2.900.000₫");
    assert_eq!(products[2].title, "Fleece Jacket");
    assert_eq!(products[2].price, "890.000₫");
    assert!(products.iter().all(|p| p.call_to_action.is_none()));

    let section = catalog_section(&products);
    assert!(section.contains("Rain Shell | https://northwind.example/products/rain-shell | 1.490.000₫\n"));
}

#[test]
fn test_detail_page_product() {
    let page = StaticPage::new("https://northwind.example/products/rain-shell?variant=7", PRODUCT_DETAIL);
    let products = ProductCatalogExtractor::default().extract_products(&page);

    assert_eq!(products.len(), 1);
    let shell = &products[0];
    assert_eq!(shell.title, "Rain Shell");
    assert_eq!(shell.url, "https://northwind.example/products/rain-shell?variant=7");
    assert_eq!(shell.price, "1.490.000₫");
    assert_eq!(shell.image_url, "https://northwind.example/cdn/rain-large.jpg");
    assert_eq!(shell.call_to_action.as_deref(), Some("Add to cart"));
}

#[test]
fn test_article_has_no_products() {
    let page = StaticPage::new("https://leaf.example/posts/tea-vs-coffee", BLOG_POST);
    assert!(ProductCatalogExtractor::default().extract_products(&page).is_empty());
}
