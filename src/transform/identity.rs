//! Deterministic product identifiers
//!
//! An identifier is the lowercase hex SHA-256 of `title|category|price`, where
//! title and category are already cleaned and the price is rounded half away
//! from zero to two fraction digits before it is rendered, so 9.991 and 9.999
//! hash differently while 47.8 and 47.80 hash the same. Nothing time- or run-dependent goes into the
//! digest, so the same source item always maps to the same identifier.

use crate::transform::PRICE_SCALE;
use rust_decimal::{Decimal, RoundingStrategy};
use sha2::{Digest, Sha256};

/// Length of a product identifier in hex characters
pub const PRODUCT_ID_LEN: usize = 64;

/// Computes the identifier for a cleaned listing
///
/// # Arguments
///
/// * `title` - Cleaned title
/// * `category` - Normalized category
/// * `price` - Source price, or `None` to leave it out of the digest
pub fn product_id(title: &str, category: &str, price: Option<Decimal>) -> String {
    let canonical = match price {
        Some(price) => {
            let price =
                price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
            format!("{}|{}|{:.2}", title, category, price)
        }
        None => format!("{}|{}", title, category),
    };

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}
