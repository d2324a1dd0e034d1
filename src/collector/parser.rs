//! HTML parser for catalogue listing and detail pages
//!
//! This module handles parsing catalogue HTML to extract:
//! - One summary per `article.product_pod` on a listing page
//! - Whether the listing page links to a next page
//! - The category from a detail page breadcrumb

use crate::transform::clean_text;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use url::Url;

/// One product as it appears on a listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSummary {
    pub title: String,

    /// Price text as displayed, currency symbol included
    pub price_text: String,

    pub availability: String,

    /// Absolute URL of the product's detail page
    pub detail_url: Option<String>,
}

/// Extracted information from a listing page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingPage {
    pub listings: Vec<ListingSummary>,

    /// True if the page carries a "next" pagination link
    pub has_next: bool,
}

/// Parses a listing page
///
/// # Arguments
///
/// * `html` - The HTML content to parse
/// * `page_url` - URL the page was fetched from, for resolving detail links
///
/// # Returns
///
/// * `Ok(ListingPage)` - Successfully parsed page (possibly with no listings)
/// * `Err(String)` - A selector failed to compile
///
/// # Example
///
/// ```
/// use pricing_pipeline::collector::parse_listing_page;
/// use url::Url;
///
/// let html = r#"<article class="product_pod">
///   <h3><a href="book_1/index.html" title="A Book">A Bo...</a></h3>
///   <p class="price_color">£10.00</p>
///   <p class="instock availability">In stock</p>
/// </article>"#;
/// let page_url = Url::parse("https://example.com/catalogue/page-1.html").unwrap();
/// let page = parse_listing_page(html, &page_url).unwrap();
/// assert_eq!(page.listings[0].title, "A Book");
/// assert!(!page.has_next);
/// ```
pub fn parse_listing_page(html: &str, page_url: &Url) -> Result<ListingPage, String> {
    let document = Html::parse_document(html);

    let article_selector = selector("article.product_pod")?;
    let link_selector = selector("h3 a")?;
    let price_selector = selector("p.price_color")?;
    let availability_selector = selector("p.availability")?;
    let next_selector = selector("li.next a")?;

    let listings = document
        .select(&article_selector)
        .map(|article| {
            let link = article.select(&link_selector).next();

            // The visible link text is truncated; the title attribute isn't
            let title = link
                .and_then(|a| a.value().attr("title"))
                .map(clean_text)
                .or_else(|| link.map(element_text))
                .unwrap_or_default();

            let detail_url = link
                .and_then(|a| a.value().attr("href"))
                .and_then(|href| page_url.join(href.trim()).ok())
                .map(|url| url.to_string());

            ListingSummary {
                title,
                price_text: first_text(article, &price_selector),
                availability: first_text(article, &availability_selector),
                detail_url,
            }
        })
        .collect();

    let has_next = document.select(&next_selector).next().is_some();

    Ok(ListingPage { listings, has_next })
}

/// Parses displayed price text such as "£51.77" into a decimal
///
/// Everything except ASCII digits and the decimal point is discarded.
/// Returns `None` when nothing numeric remains.
pub fn parse_price(text: &str) -> Option<Decimal> {
    let numeric: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if numeric.is_empty() {
        return None;
    }

    Decimal::from_str(&numeric).ok()
}

/// Extracts the category from a detail page breadcrumb
///
/// The breadcrumb reads Home / Books / Category / Title, so the category is
/// its third link.
pub fn parse_category(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let crumb_selector = Selector::parse("ul.breadcrumb a").ok()?;

    document
        .select(&crumb_selector)
        .nth(2)
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn selector(css: &str) -> Result<Selector, String> {
    Selector::parse(css).map_err(|e| format!("invalid selector {:?}: {:?}", css, e))
}

fn element_text(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn first_text(parent: ElementRef<'_>, selector: &Selector) -> String {
    parent
        .select(selector)
        .next()
        .map(element_text)
        .unwrap_or_default()
}
