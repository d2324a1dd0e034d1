//! Pipeline stage wiring
//!
//! One run goes through these stages:
//! 1. Open the destination store and check its schema
//! 2. Collect listings and fetch the exchange rate concurrently
//! 3. Stage the rate, even when nothing was collected, then capture the raw
//!    listings if enabled
//! 4. Transform listings into products
//! 5. Load the products in the configured mode
//!
//! Every boundary call is bounded by a timeout and retried per the
//! configured [`RetryPolicy`]. Fatal errors abort the run before the load,
//! leaving the store untouched.

mod artifacts;
mod summary;

pub use artifacts::{ArtifactWriter, LISTINGS_FILE, PRODUCTS_FILE, RATE_FILE, SUMMARY_FILE};
pub use summary::RunSummary;

use crate::collector::Collector;
use crate::config::Config;
use crate::rates::RateProvider;
use crate::retry::{with_retry, RetryPolicy};
use crate::storage::{ProductStore, SqliteStore};
use crate::transform::{TransformOutput, Transformer};
use crate::{PipelineError, Result};
use chrono::Utc;
use std::future::ready;

/// Runs the pipeline once
///
/// # Returns
///
/// * `Ok(RunSummary)` - Products were loaded
/// * `Err(PipelineError)` - The run aborted; see [`PipelineError::is_retryable`]
///   for whether a rerun may succeed
pub async fn run(config: &Config) -> Result<RunSummary> {
    let started_at = Utc::now();
    let policy = RetryPolicy::from_config(&config.retry);
    let load_mode = config.output.load_mode;

    let artifacts = config
        .output
        .artifacts_dir
        .as_deref()
        .map(ArtifactWriter::new)
        .transpose()?;

    let mut store = with_retry(&policy, "open store", || {
        ready(SqliteStore::from_config(&config.output).map_err(PipelineError::from))
    })
    .await?;
    store.verify()?;

    // ===== Extract =====

    let collector = Collector::new(&config.source, policy)?;
    let provider = RateProvider::new(&config.rate, policy)?;

    tracing::info!(
        "Collecting up to {} page(s) from {} and fetching {}->{} rate",
        config.source.page_limit,
        config.source.base_url,
        config.rate.base_currency,
        config.rate.target_currency
    );

    let (listings, rate) = tokio::join!(
        collector.collect(config.source.page_limit),
        provider.fetch()
    );
    let rate = rate?;

    if let Some(writer) = &artifacts {
        writer.write(LISTINGS_FILE, &listings)?;
        writer.write(RATE_FILE, &rate)?;
    }

    with_retry(&policy, "stage rate", || {
        ready(store.upsert_rate(&rate).map_err(PipelineError::from))
    })
    .await?;

    if listings.is_empty() {
        return Err(PipelineError::NoListings);
    }

    if config.output.capture_raw {
        let captured = with_retry(&policy, "capture raw listings", || {
            ready(store.capture_raw(&listings).map_err(PipelineError::from))
        })
        .await?;
        tracing::info!("Captured {} raw listings", captured);
    }

    // ===== Transform =====

    let transformer = Transformer::from_config(&config.pricing);
    let output = transformer.transform(&listings, Some(&rate))?;
    check_dropped(&output, config.output.max_dropped_records)?;

    if let Some(writer) = &artifacts {
        writer.write(PRODUCTS_FILE, &output.products)?;
    }

    // ===== Load =====

    let rows_loaded = with_retry(&policy, "load products", || {
        ready(
            store
                .load_products(&output.products, load_mode)
                .map_err(PipelineError::from),
        )
    })
    .await?;

    tracing::info!("Loaded {} products ({})", rows_loaded, load_mode);

    let summary = RunSummary {
        listings_collected: listings.len(),
        products_transformed: output.products.len(),
        records_dropped: output.dropped_count(),
        rows_loaded,
        rate,
        load_mode,
        started_at,
        finished_at: Utc::now(),
    };

    if let Some(writer) = &artifacts {
        writer.write(SUMMARY_FILE, &summary)?;
    }

    Ok(summary)
}

/// Enforces the dropped-record threshold and the non-empty output rule
///
/// Only called for a non-empty input batch.
fn check_dropped(output: &TransformOutput, max_dropped: Option<usize>) -> Result<()> {
    let dropped = output.dropped_count();

    if let Some(limit) = max_dropped {
        if dropped > limit {
            return Err(PipelineError::TooManyDropped { dropped, limit });
        }
    }

    if output.products.is_empty() {
        return Err(PipelineError::NoProducts { dropped });
    }

    Ok(())
}
