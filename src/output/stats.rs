//! Statistics generation from the product catalog
//!
//! This module provides functionality for extracting and displaying
//! catalog statistics from the storage layer.

use crate::records::{AvailabilityStatus, ExchangeRate, PriceTier};
use crate::storage::ProductStore;
use crate::Result;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::fmt::Write;

/// Catalog statistics summary
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStatistics {
    /// Total number of products in the catalog
    pub total_products: u64,

    /// Rows in the raw capture table
    pub raw_listings: u64,

    pub products_by_tier: HashMap<PriceTier, u64>,

    pub products_by_availability: HashMap<AvailabilityStatus, u64>,

    /// Category counts, largest first
    pub products_by_category: Vec<(String, u64)>,

    /// Mean target-currency price, `None` for an empty catalog
    pub average_price_target: Option<Decimal>,

    /// Most recent staged rate for the configured pair
    pub latest_rate: Option<ExchangeRate>,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The store to query
/// * `base` - Base currency of the rate to report
/// * `target` - Target currency of the rate to report
pub fn load_statistics(
    store: &dyn ProductStore,
    base: &str,
    target: &str,
) -> Result<CatalogStatistics> {
    let total_products = store.count_products()?;
    let raw_listings = store.count_raw_listings()?;
    let products_by_tier = store.count_by_tier()?;
    let products_by_availability = store.count_by_availability()?;
    let products_by_category = store.count_by_category()?;
    let latest_rate = store.latest_rate(base, target)?;
    let average_price_target = store.average_price_target()?;

    Ok(CatalogStatistics {
        total_products,
        raw_listings,
        products_by_tier,
        products_by_availability,
        products_by_category,
        average_price_target,
        latest_rate,
    })
}

/// Renders statistics as the text shown by `--stats`
pub fn format_statistics(stats: &CatalogStatistics) -> String {
    let mut out = String::new();
    let percent = |count: u64| {
        if stats.total_products > 0 {
            (count as f64 / stats.total_products as f64) * 100.0
        } else {
            0.0
        }
    };

    let _ = writeln!(out, "=== Catalog Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Total products: {}", stats.total_products);
    let _ = writeln!(out, "  Raw listings captured: {}", stats.raw_listings);
    match stats.average_price_target {
        Some(avg) => {
            let _ = writeln!(out, "  Average target price: {}", avg);
        }
        None => {
            let _ = writeln!(out, "  Average target price: n/a");
        }
    }
    match &stats.latest_rate {
        Some(rate) => {
            let _ = writeln!(
                out,
                "  Latest rate: 1 {} = {} {} ({})",
                rate.base_currency, rate.rate, rate.target_currency, rate.date
            );
        }
        None => {
            let _ = writeln!(out, "  Latest rate: none staged");
        }
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Products by Price Tier:");
    for tier in PriceTier::all() {
        let count = stats.products_by_tier.get(&tier).copied().unwrap_or(0);
        let _ = writeln!(
            out,
            "  {}: {} ({:.1}%)",
            tier.to_db_string(),
            count,
            percent(count)
        );
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Products by Availability:");
    for status in AvailabilityStatus::all() {
        let count = stats
            .products_by_availability
            .get(&status)
            .copied()
            .unwrap_or(0);
        let _ = writeln!(out, "  {}: {} ({:.1}%)", status, count, percent(count));
    }

    if !stats.products_by_category.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Products by Category ({}):", stats.products_by_category.len());
        for (category, count) in &stats.products_by_category {
            let _ = writeln!(out, "  {}: {}", category, count);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CatalogStatistics) {
    print!("{}", format_statistics(stats));
}
