//! Integration tests for full pipeline runs
//!
//! These tests use wiremock to stand in for the catalogue site and the
//! exchange-rate API, and a temporary SQLite file as the destination store.

use pricing_pipeline::config::{parse_config, Config};
use pricing_pipeline::pipeline::{self, PRODUCTS_FILE, SUMMARY_FILE};
use pricing_pipeline::storage::{ProductStore, SqliteStore, StorageError};
use pricing_pipeline::{AvailabilityStatus, LoadMode, PipelineError, PriceTier};
use rust_decimal_macros::dec;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// (slug, title, price, availability, category)
type Book = (&'static str, &'static str, &'static str, &'static str, &'static str);

const PAGE_ONE: &[Book] = &[
    ("attic_1", "A Light in the Attic", "£51.77", "In stock (22 available)", "Poetry"),
    ("velvet_2", "Tipping the Velvet", "£13.74", "In stock (3 available)", "historical fiction"),
];

const PAGE_TWO: &[Book] = &[
    ("soumission_3", "Soumission", "£30.10", "Out of stock", "Fiction"),
    ("sharp_4", "Sharp Objects", "£47.82", "In stock", "Default"),
];

fn listing_page(books: &[Book], has_next: bool) -> String {
    let mut html = String::from("<html><body><ol class=\"row\">");
    for (slug, title, price, availability, _) in books {
        html.push_str(&format!(
            r#"<li><article class="product_pod">
                 <h3><a href="{slug}/index.html" title="{title}">{title}</a></h3>
                 <p class="price_color">{price}</p>
                 <p class="instock availability">{availability}</p>
               </article></li>"#
        ));
    }
    html.push_str("</ol>");
    if has_next {
        html.push_str(r#"<ul class="pager"><li class="next"><a href="page-2.html">next</a></li></ul>"#);
    }
    html.push_str("</body></html>");
    html
}

fn detail_page(category: &str) -> String {
    format!(
        r#"<ul class="breadcrumb">
             <li><a href="../../index.html">Home</a></li>
             <li><a href="../category/books_1/index.html">Books</a></li>
             <li><a href="../category/books/x/index.html">{}</a></li>
           </ul>"#,
        category
    )
}

/// Mounts a two-page catalogue with detail pages and a rate endpoint
async fn mount_catalogue(server: &MockServer, rate: serde_json::Value) {
    for (page, books, has_next) in [(1, PAGE_ONE, true), (2, PAGE_TWO, false)] {
        Mock::given(method("GET"))
            .and(path(format!("/catalogue/page-{}.html", page)))
            .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(books, has_next)))
            .mount(server)
            .await;

        for (slug, _, _, _, category) in books {
            Mock::given(method("GET"))
                .and(path(format!("/catalogue/{}/index.html", slug)))
                .respond_with(ResponseTemplate::new(200).set_body_string(detail_page(category)))
                .mount(server)
                .await;
        }
    }

    mount_rate(server, rate).await;
}

async fn mount_rate(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/latest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn gbp_inr(rate: f64) -> serde_json::Value {
    json!({ "success": true, "date": "2024-03-01", "rates": { "INR": rate } })
}

fn config_for(server: &MockServer, dir: &Path, load_mode: &str, extra_output: &str) -> Config {
    let toml = format!(
        r#"
[source]
base-url = "{uri}"
page-limit = 5
request-timeout-secs = 5

[rate]
api-url = "{uri}/latest"
base-currency = "GBP"
target-currency = "INR"
request-timeout-secs = 5

[retry]
max-attempts = 2
initial-backoff-ms = 1
max-backoff-ms = 5

[pricing]
cheap-below = 2000.00
expensive-from = 5000.00

[output]
database-path = "{db}"
load-mode = "{load_mode}"
capture-raw = true
write-timeout-secs = 2
{extra_output}
"#,
        uri = server.uri(),
        db = dir.join("pipeline.db").display(),
        load_mode = load_mode,
        extra_output = extra_output,
    );

    parse_config(&toml).unwrap()
}

fn init_store(config: &Config) -> SqliteStore {
    let store = SqliteStore::from_config(&config.output).unwrap();
    store.initialize().unwrap();
    store
}

fn open_store(config: &Config) -> SqliteStore {
    SqliteStore::open(Path::new(&config.output.database_path), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_full_run_replace_mode() {
    let server = MockServer::start().await;
    mount_catalogue(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let artifacts = dir.path().join("artifacts");
    let config = config_for(
        &server,
        dir.path(),
        "replace",
        &format!("artifacts-dir = \"{}\"", artifacts.display()),
    );
    init_store(&config);

    let summary = pipeline::run(&config).await.unwrap();

    assert_eq!(summary.listings_collected, 4);
    assert_eq!(summary.products_transformed, 4);
    assert_eq!(summary.records_dropped, 0);
    assert_eq!(summary.rows_loaded, 4);
    assert_eq!(summary.load_mode, LoadMode::Replace);
    assert_eq!(summary.rate.rate, dec!(105.5));

    let store = open_store(&config);
    let products = store.list_products().unwrap();
    assert_eq!(products.len(), 4);

    let attic = products
        .iter()
        .find(|p| p.title == "A Light in the Attic")
        .unwrap();
    assert_eq!(attic.category, "Poetry");
    assert_eq!(attic.price_source, dec!(51.77));
    assert_eq!(attic.price_target, dec!(5461.74));
    assert_eq!(attic.price_tier, PriceTier::Expensive);
    assert_eq!(attic.stock_quantity, 22);

    let velvet = products
        .iter()
        .find(|p| p.title == "Tipping the Velvet")
        .unwrap();
    assert_eq!(velvet.category, "Historical Fiction");
    assert_eq!(velvet.price_target, dec!(1449.57));
    assert_eq!(velvet.price_tier, PriceTier::Cheap);

    let soumission = products.iter().find(|p| p.title == "Soumission").unwrap();
    assert_eq!(soumission.availability_status, AvailabilityStatus::OutOfStock);
    assert_eq!(soumission.stock_quantity, 0);
    assert_eq!(soumission.price_tier, PriceTier::Moderate);

    assert!(products.iter().all(|p| p.product_id.len() == 64));

    let staged = store.latest_rate("GBP", "INR").unwrap().unwrap();
    assert_eq!(staged.rate, dec!(105.5));
    assert_eq!(store.count_raw_listings().unwrap(), 4);

    let written: Vec<serde_json::Value> =
        serde_json::from_str(&std::fs::read_to_string(artifacts.join(PRODUCTS_FILE)).unwrap())
            .unwrap();
    assert_eq!(written.len(), 4);
    let summary_json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(artifacts.join(SUMMARY_FILE)).unwrap())
            .unwrap();
    assert_eq!(summary_json["rows_loaded"], 4);
}

#[tokio::test]
async fn test_replace_runs_are_idempotent() {
    let server = MockServer::start().await;
    mount_catalogue(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "");
    init_store(&config);

    pipeline::run(&config).await.unwrap();
    let first: Vec<String> = open_store(&config)
        .list_products()
        .unwrap()
        .into_iter()
        .map(|p| p.product_id)
        .collect();

    pipeline::run(&config).await.unwrap();
    let second: Vec<String> = open_store(&config)
        .list_products()
        .unwrap()
        .into_iter()
        .map(|p| p.product_id)
        .collect();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_upsert_runs_keep_first_scraped_at() {
    let server = MockServer::start().await;
    mount_catalogue(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "upsert", "");
    init_store(&config);

    pipeline::run(&config).await.unwrap();
    let first = open_store(&config).list_products().unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    let summary = pipeline::run(&config).await.unwrap();
    let second = open_store(&config).list_products().unwrap();

    assert_eq!(summary.load_mode, LoadMode::Upsert);
    assert_eq!(first.len(), second.len());
    for (before, after) in first.iter().zip(&second) {
        assert_eq!(before.product_id, after.product_id);
        assert_eq!(before.scraped_at, after.scraped_at);
        assert!(after.updated_at > before.updated_at);
        assert_eq!(before.price_target, after.price_target);
    }
}

#[tokio::test]
async fn test_missing_schema_fails_before_scraping() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "");

    let err = pipeline::run(&config).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Storage(StorageError::SchemaMismatch(_))
    ));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_invalid_rate_leaves_store_untouched() {
    let server = MockServer::start().await;
    mount_catalogue(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "");
    init_store(&config);
    pipeline::run(&config).await.unwrap();
    let before = open_store(&config).list_products().unwrap();

    // Same database, new upstream quoting a zero rate
    let broken = MockServer::start().await;
    mount_catalogue(&broken, json!({ "rates": { "INR": 0 } })).await;
    let config = config_for(&broken, dir.path(), "replace", "");

    let err = pipeline::run(&config).await.unwrap_err();

    assert!(matches!(err, PipelineError::InvalidRate(_)));
    assert_eq!(open_store(&config).list_products().unwrap(), before);
}

#[tokio::test]
async fn test_no_listings_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[], false)))
        .mount(&server)
        .await;
    mount_rate(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "");
    init_store(&config);

    let err = pipeline::run(&config).await.unwrap_err();

    assert!(matches!(err, PipelineError::NoListings));
    let store = open_store(&config);
    assert_eq!(store.count_products().unwrap(), 0);
    let staged = store.latest_rate("GBP", "INR").unwrap().unwrap();
    assert_eq!(staged.rate, dec!(105.5));
}

#[tokio::test]
async fn test_repeated_listing_loads_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[
                ("same_1", "Same", "£10.00", "In stock", "Poetry"),
                ("same_1", "Same", "£10.00", "In stock", "Poetry"),
            ],
            false,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/same_1/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(detail_page("Poetry")))
        .mount(&server)
        .await;
    mount_rate(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "");
    init_store(&config);

    let summary = pipeline::run(&config).await.unwrap();

    assert_eq!(summary.listings_collected, 2);
    assert_eq!(summary.products_transformed, 2);
    assert_eq!(summary.rows_loaded, 1);
    assert_eq!(open_store(&config).count_products().unwrap(), 1);
}

#[tokio::test]
async fn test_dropped_records_over_threshold_abort_load() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(
            &[
                ("ok_1", "Kept", "£10.00", "In stock", "Poetry"),
                ("blank_2", "", "£12.00", "In stock", "Poetry"),
            ],
            false,
        )))
        .mount(&server)
        .await;
    mount_rate(&server, gbp_inr(105.5)).await;

    let dir = TempDir::new().unwrap();
    let config = config_for(&server, dir.path(), "replace", "max-dropped-records = 0");
    init_store(&config);

    let err = pipeline::run(&config).await.unwrap_err();

    assert!(matches!(
        err,
        PipelineError::TooManyDropped {
            dropped: 1,
            limit: 0
        }
    ));
    assert_eq!(open_store(&config).count_products().unwrap(), 0);
}
