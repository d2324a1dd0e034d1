//! Transformer: raw listings + one exchange rate → products
//!
//! This module handles the single in-memory pass that turns collected
//! listings into catalog products:
//! - Cleaning titles and normalizing categories
//! - Parsing availability text into a status and stock quantity
//! - Converting prices into the target currency
//! - Assigning a price tier
//! - Deriving a deterministic product identifier
//!
//! Listings that can't be turned into a product are dropped and reported in
//! [`TransformOutput::dropped`]; a missing or non-positive rate aborts the
//! whole batch.

mod availability;
mod identity;
mod pricing;
mod text;

pub use availability::parse_availability;
pub use identity::{product_id, PRODUCT_ID_LEN};
pub use pricing::{convert_price, PriceThresholds, PRICE_SCALE};
pub use text::{clean_text, normalize_category, UNCATEGORIZED};

use crate::config::PricingConfig;
use crate::records::{ExchangeRate, Product, RawListing};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Errors that abort a transform batch
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("No exchange rate available")]
    MissingRate,

    #[error("Exchange rate {rate} for {base}->{target} is not positive")]
    NonPositiveRate {
        base: String,
        target: String,
        rate: Decimal,
    },
}

/// Why a single listing was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Title is empty after cleaning
    EmptyTitle,
    /// Source price is negative
    NegativePrice,
    /// Converted price doesn't fit in a decimal
    PriceOverflow,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "empty title"),
            Self::NegativePrice => write!(f, "negative price"),
            Self::PriceOverflow => write!(f, "converted price out of range"),
        }
    }
}

/// A listing that didn't make it into the output
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedRecord {
    /// Position of the listing in the input
    pub index: usize,
    pub title: String,
    pub reason: DropReason,
}

/// Result of transforming one batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutput {
    pub products: Vec<Product>,
    pub dropped: Vec<DroppedRecord>,
}

impl TransformOutput {
    pub fn dropped_count(&self) -> usize {
        self.dropped.len()
    }
}

/// Stateless listing-to-product mapper
#[derive(Debug, Clone)]
pub struct Transformer {
    thresholds: PriceThresholds,
    id_includes_price: bool,
}

impl Transformer {
    pub fn new(thresholds: PriceThresholds, id_includes_price: bool) -> Self {
        Self {
            thresholds,
            id_includes_price,
        }
    }

    pub fn from_config(config: &PricingConfig) -> Self {
        Self::new(PriceThresholds::from_config(config), config.id_includes_price)
    }

    /// Transforms a batch of listings using one exchange rate
    ///
    /// Output order follows input order. The number of products equals the
    /// number of listings minus the number of dropped records.
    ///
    /// # Errors
    ///
    /// * `TransformError::MissingRate` - `rate` is `None`
    /// * `TransformError::NonPositiveRate` - the rate is zero or negative
    pub fn transform(
        &self,
        listings: &[RawListing],
        rate: Option<&ExchangeRate>,
    ) -> Result<TransformOutput, TransformError> {
        let rate = rate.ok_or(TransformError::MissingRate)?;
        if !rate.is_usable() {
            return Err(TransformError::NonPositiveRate {
                base: rate.base_currency.clone(),
                target: rate.target_currency.clone(),
                rate: rate.rate,
            });
        }

        let mut output = TransformOutput::default();

        for (index, listing) in listings.iter().enumerate() {
            match self.transform_listing(listing, rate) {
                Ok(product) => output.products.push(product),
                Err(reason) => {
                    tracing::warn!(
                        "Dropping listing #{} ({:?}): {}",
                        index,
                        listing.title,
                        reason
                    );
                    output.dropped.push(DroppedRecord {
                        index,
                        title: listing.title.clone(),
                        reason,
                    });
                }
            }
        }

        tracing::info!(
            "Transformed {} of {} listings ({} dropped) at 1 {} = {} {}",
            output.products.len(),
            listings.len(),
            output.dropped_count(),
            rate.base_currency,
            rate.rate,
            rate.target_currency
        );

        Ok(output)
    }

    /// Transforms one listing; the rate must already be known to be usable
    pub fn transform_listing(
        &self,
        listing: &RawListing,
        rate: &ExchangeRate,
    ) -> Result<Product, DropReason> {
        let title = clean_text(&listing.title);
        if title.is_empty() {
            return Err(DropReason::EmptyTitle);
        }

        if listing.price.is_sign_negative() && !listing.price.is_zero() {
            return Err(DropReason::NegativePrice);
        }

        let price_source = listing.price;
        let category = normalize_category(&listing.category);
        let (availability_status, stock_quantity) = parse_availability(&listing.availability);
        let price_target =
            convert_price(price_source, rate.rate).ok_or(DropReason::PriceOverflow)?;
        let price_tier = self.thresholds.classify(price_target);
        let product_id = product_id(
            &title,
            &category,
            self.id_includes_price.then_some(price_source),
        );

        Ok(Product {
            product_id,
            title,
            price_source,
            price_target,
            category,
            availability_status,
            stock_quantity,
            price_tier,
            scraped_at: listing.scraped_at,
            updated_at: listing.scraped_at,
        })
    }
}
