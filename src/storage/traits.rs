//! Storage traits and error types
//!
//! This module defines the trait interface for the destination store and
//! how SQLite failures map onto retryable and fatal errors.

use crate::records::{AvailabilityStatus, ExchangeRate, PriceTier, Product, RawListing};
use crate::storage::LoadMode;
use rusqlite::ErrorCode;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// Busy, locked, unreachable or failing I/O; worth retrying
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A table or column the pipeline needs does not exist
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Invalid stored value: {0}")]
    InvalidValue(String),

    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl StorageError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        let message = err.to_string();

        if is_schema_message(&message) {
            return Self::SchemaMismatch(message);
        }

        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::FileLockingProtocolFailed,
            ) => Self::Unavailable(message),
            _ => Self::Sqlite(err),
        }
    }
}

fn is_schema_message(message: &str) -> bool {
    message.contains("no such table")
        || message.contains("no such column")
        || message.contains("has no column named")
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for destination store implementations
///
/// The store does not serialize concurrent pipeline runs; callers must not
/// load into the same database from two runs at once.
pub trait ProductStore {
    // ===== Products =====

    /// Persists a batch of products and returns the number of distinct rows written
    ///
    /// In [`LoadMode::Replace`] the table ends up holding exactly `products`;
    /// in [`LoadMode::Upsert`] existing rows are merged by `product_id`. Either
    /// way the batch is applied atomically. When the batch repeats a
    /// `product_id`, its last occurrence wins.
    fn load_products(&mut self, products: &[Product], mode: LoadMode) -> StorageResult<usize>;

    /// Gets a product by identifier
    fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>>;

    /// Gets every stored product, ordered by identifier
    fn list_products(&self) -> StorageResult<Vec<Product>>;

    // ===== Exchange Rates =====

    /// Inserts or overwrites the rate for its (date, base, target) key
    fn upsert_rate(&mut self, rate: &ExchangeRate) -> StorageResult<()>;

    /// Gets the most recent stored rate for a currency pair
    fn latest_rate(&self, base: &str, target: &str) -> StorageResult<Option<ExchangeRate>>;

    // ===== Raw Capture =====

    /// Replaces the raw capture table with the given listings
    fn capture_raw(&mut self, listings: &[RawListing]) -> StorageResult<usize>;

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64>;

    fn count_raw_listings(&self) -> StorageResult<u64>;

    fn count_by_tier(&self) -> StorageResult<HashMap<PriceTier, u64>>;

    fn count_by_availability(&self) -> StorageResult<HashMap<AvailabilityStatus, u64>>;

    /// Product counts per category, largest first
    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>>;

    /// Mean `price_target` rounded to two places, `None` when there are no products
    fn average_price_target(&self) -> StorageResult<Option<Decimal>>;
}
