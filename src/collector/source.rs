//! Paginated catalogue source
//!
//! [`Collector`] owns the HTTP client and knows how to turn one listing page
//! into raw listings. [`PageCursor`] walks the pages lazily, one fetch per
//! call, and can be restarted from the first page.

use crate::collector::fetcher::{build_http_client, fetch_page};
use crate::collector::parser::{parse_category, parse_listing_page, parse_price, ListingSummary};
use crate::config::SourceConfig;
use crate::records::RawListing;
use crate::retry::{with_retry, RetryPolicy};
use crate::{ConfigError, PipelineError, Result};
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Category recorded when a detail page can't provide one
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Listings extracted from one page
#[derive(Debug, Clone, Default)]
pub struct PageListings {
    pub listings: Vec<RawListing>,

    /// False once the source signals there is nothing after this page
    pub has_more: bool,
}

/// Scrapes listings from a paginated catalogue
pub struct Collector {
    client: Client,
    base_url: Url,
    fetch_categories: bool,
    policy: RetryPolicy,
}

impl Collector {
    /// Creates a collector for the configured source
    ///
    /// # Errors
    ///
    /// * `PipelineError::Config` - `base-url` is not a valid URL
    /// * `PipelineError::Reqwest` - The HTTP client could not be built
    pub fn new(config: &SourceConfig, policy: RetryPolicy) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;

        // Joins must append below the base path, not replace its last segment
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.request_timeout_secs),
        )?;

        Ok(Self {
            client,
            base_url,
            fetch_categories: config.fetch_categories,
            policy,
        })
    }

    /// Returns a cursor over at most `page_limit` pages, starting at page 1
    pub fn pages(&self, page_limit: u32) -> PageCursor<'_> {
        PageCursor {
            collector: self,
            next_page: 1,
            page_limit,
            finished: false,
        }
    }

    /// Collects every listing from up to `page_limit` pages
    ///
    /// A page that keeps failing after its retries ends the sequence; the
    /// listings gathered so far are returned.
    pub async fn collect(&self, page_limit: u32) -> Vec<RawListing> {
        let mut cursor = self.pages(page_limit);
        let mut listings = Vec::new();

        while let Some(batch) = cursor.next_page().await {
            listings.extend(batch);
        }

        tracing::info!(
            "Collected {} listings from {} page(s)",
            listings.len(),
            cursor.pages_fetched()
        );

        listings
    }

    /// URL of a 1-based listing page
    pub fn page_url(&self, page: u32) -> Result<Url> {
        self.base_url
            .join(&format!("catalogue/page-{}.html", page))
            .map_err(|e| ConfigError::InvalidUrl(format!("page {}: {}", page, e)).into())
    }

    /// Fetches and parses one listing page, with retries
    pub async fn fetch_listings(&self, page: u32) -> Result<PageListings> {
        let url = self.page_url(page)?;
        let client = &self.client;
        let url_str = url.as_str();

        let html = with_retry(&self.policy, &format!("fetch page {}", page), || {
            fetch_page(client, url_str)
        })
        .await?;

        let parsed = parse_listing_page(&html, &url).map_err(|message| PipelineError::HtmlParse {
            url: url.to_string(),
            message,
        })?;

        let scraped_at = Utc::now();
        let mut listings = Vec::with_capacity(parsed.listings.len());

        for summary in &parsed.listings {
            let Some(price) = parse_price(&summary.price_text) else {
                tracing::warn!(
                    "Skipping {:?} on page {}: unparseable price {:?}",
                    summary.title,
                    page,
                    summary.price_text
                );
                continue;
            };

            listings.push(RawListing {
                title: summary.title.clone(),
                price,
                category: self.resolve_category(summary).await,
                availability: summary.availability.clone(),
                scraped_at,
            });
        }

        tracing::debug!(
            "Page {}: {} listings ({} on page)",
            page,
            listings.len(),
            parsed.listings.len()
        );

        Ok(PageListings {
            listings,
            has_more: parsed.has_next && !parsed.listings.is_empty(),
        })
    }

    /// Looks up the category on the detail page; a single attempt
    async fn resolve_category(&self, summary: &ListingSummary) -> String {
        if !self.fetch_categories {
            return UNKNOWN_CATEGORY.to_string();
        }

        let Some(detail_url) = summary.detail_url.as_deref() else {
            return UNKNOWN_CATEGORY.to_string();
        };

        match fetch_page(&self.client, detail_url).await {
            Ok(html) => parse_category(&html).unwrap_or_else(|| UNKNOWN_CATEGORY.to_string()),
            Err(e) => {
                tracing::warn!("Could not fetch category from {}: {}", detail_url, e);
                UNKNOWN_CATEGORY.to_string()
            }
        }
    }
}

/// Lazy, finite walk over listing pages
///
/// Each [`next_page`](PageCursor::next_page) call fetches one page. The
/// sequence ends at the page limit, when the source has no next page, or
/// when a page still fails after its retries.
pub struct PageCursor<'a> {
    collector: &'a Collector,
    next_page: u32,
    page_limit: u32,
    finished: bool,
}

impl<'a> PageCursor<'a> {
    /// Fetches the next page; `None` once the sequence has ended
    pub async fn next_page(&mut self) -> Option<Vec<RawListing>> {
        if self.finished || self.next_page > self.page_limit {
            self.finished = true;
            return None;
        }

        let page = self.next_page;
        self.next_page += 1;

        match self.collector.fetch_listings(page).await {
            Ok(PageListings { listings, has_more }) => {
                if !has_more {
                    tracing::debug!("Source has no pages after {}", page);
                    self.finished = true;
                }
                Some(listings)
            }
            Err(e) => {
                tracing::warn!("Page {} failed, ending collection: {}", page, e);
                self.finished = true;
                None
            }
        }
    }

    /// Rewinds to the first page
    pub fn restart(&mut self) {
        self.next_page = 1;
        self.finished = false;
    }

    /// Number of pages requested so far, failed ones included
    pub fn pages_fetched(&self) -> u32 {
        self.next_page - 1
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source_config(base_url: &str, fetch_categories: bool) -> SourceConfig {
        SourceConfig {
            base_url: base_url.to_string(),
            page_limit: 5,
            fetch_categories,
            request_timeout_secs: 5,
            user_agent: "pricing-pipeline/test".to_string(),
        }
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 2,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(1),
        }
    }

    /// Builds a listing page; each item is (slug, title, price, availability)
    fn listing_page(items: &[(&str, &str, &str, &str)], has_next: bool) -> String {
        let mut html = String::from("<html><body><ol class=\"row\">");
        for (slug, title, price, availability) in items {
            html.push_str(&format!(
                r#"<li><article class="product_pod">
                     <h3><a href="{}/index.html" title="{}">{}</a></h3>
                     <p class="price_color">{}</p>
                     <p class="instock availability">{}</p>
                   </article></li>"#,
                slug, title, title, price, availability
            ));
        }
        html.push_str("</ol>");
        if has_next {
            html.push_str(r##"<ul class="pager"><li class="next"><a href="#">next</a></li></ul>"##);
        }
        html.push_str("</body></html>");
        html
    }

    fn detail_page(category: &str) -> String {
        format!(
            r#"<ul class="breadcrumb">
                 <li><a href="/">Home</a></li>
                 <li><a href="/books">Books</a></li>
                 <li><a href="/books/c">{}</a></li>
               </ul>"#,
            category
        )
    }

    async fn mount_page(server: &MockServer, page: u32, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/catalogue/page-{}.html", page)))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_collect_until_no_next_page() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            listing_page(&[("attic_1", "A Light in the Attic", "£51.77", "In stock (22 available)")], true),
        )
        .await;
        mount_page(
            &server,
            2,
            listing_page(&[("velvet_2", "Tipping the Velvet", "£53.74", "In stock")], false),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/catalogue/page-3.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/catalogue/attic_1/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Poetry")))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/catalogue/velvet_2/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Historical Fiction")))
            .mount(&server)
            .await;

        let collector = Collector::new(&source_config(&server.uri(), true), fast_retry()).unwrap();
        let listings = collector.collect(5).await;

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].title, "A Light in the Attic");
        assert_eq!(listings[0].price, dec!(51.77));
        assert_eq!(listings[0].category, "Poetry");
        assert_eq!(listings[0].availability, "In stock (22 available)");
        assert_eq!(listings[1].category, "Historical Fiction");
    }

    #[tokio::test]
    async fn test_page_limit_is_respected() {
        let server = MockServer::start().await;
        mount_page(&server, 1, listing_page(&[("a_1", "A", "£1.00", "In stock")], true)).await;
        Mock::given(method("GET"))
            .and(path("/catalogue/page-2.html"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let collector = Collector::new(&source_config(&server.uri(), false), fast_retry()).unwrap();
        let listings = collector.collect(1).await;

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].category, UNKNOWN_CATEGORY);
    }

    #[tokio::test]
    async fn test_failing_page_ends_sequence_with_partial_results() {
        let server = MockServer::start().await;
        mount_page(&server, 1, listing_page(&[("a_1", "A", "£1.00", "In stock")], true)).await;
        Mock::given(method("GET"))
            .and(path("/catalogue/page-2.html"))
            .respond_with(ResponseTemplate::new(503))
            .expect(2)
            .mount(&server)
            .await;

        let collector = Collector::new(&source_config(&server.uri(), false), fast_retry()).unwrap();
        let mut cursor = collector.pages(5);

        let first = cursor.next_page().await.unwrap();
        assert_eq!(first.len(), 1);
        assert!(cursor.next_page().await.is_none());
        assert!(cursor.is_finished());
        assert_eq!(cursor.pages_fetched(), 2);
    }

    #[tokio::test]
    async fn test_category_falls_back_when_detail_page_fails() {
        let server = MockServer::start().await;
        mount_page(&server, 1, listing_page(&[("gone_1", "Gone", "£5.00", "In stock")], false)).await;

        let collector = Collector::new(&source_config(&server.uri(), true), fast_retry()).unwrap();
        let listings = collector.collect(3).await;

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].category, UNKNOWN_CATEGORY);
    }

    #[tokio::test]
    async fn test_unparseable_price_is_skipped() {
        let server = MockServer::start().await;
        mount_page(
            &server,
            1,
            listing_page(
                &[("a_1", "Priced", "£9.99", "In stock"), ("b_2", "Unpriced", "n/a", "In stock")],
                false,
            ),
        )
        .await;

        let collector = Collector::new(&source_config(&server.uri(), false), fast_retry()).unwrap();
        let listings = collector.collect(1).await;

        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].title, "Priced");
    }

    #[tokio::test]
    async fn test_cursor_restart_yields_same_pages() {
        let server = MockServer::start().await;
        mount_page(&server, 1, listing_page(&[("a_1", "A", "£1.00", "In stock")], true)).await;
        mount_page(&server, 2, listing_page(&[("b_2", "B", "£2.00", "In stock")], false)).await;

        let collector = Collector::new(&source_config(&server.uri(), false), fast_retry()).unwrap();
        let mut cursor = collector.pages(5);

        let mut first_pass = Vec::new();
        while let Some(batch) = cursor.next_page().await {
            first_pass.extend(batch.into_iter().map(|l| l.title));
        }

        cursor.restart();
        let mut second_pass = Vec::new();
        while let Some(batch) = cursor.next_page().await {
            second_pass.extend(batch.into_iter().map(|l| l.title));
        }

        assert_eq!(first_pass, vec!["A", "B"]);
        assert_eq!(first_pass, second_pass);
    }

    #[tokio::test]
    async fn test_empty_first_page_yields_nothing() {
        let server = MockServer::start().await;
        mount_page(&server, 1, listing_page(&[], true)).await;

        let collector = Collector::new(&source_config(&server.uri(), false), fast_retry()).unwrap();
        assert!(collector.collect(5).await.is_empty());
    }

    #[test]
    fn test_page_url_keeps_base_path() {
        let collector = Collector::new(
            &source_config("https://example.com/shop", false),
            RetryPolicy::no_retry(),
        )
        .unwrap();

        assert_eq!(
            collector.page_url(3).unwrap().as_str(),
            "https://example.com/shop/catalogue/page-3.html"
        );
    }
}
