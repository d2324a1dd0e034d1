//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the ProductStore trait.

use crate::config::OutputConfig;
use crate::records::{AvailabilityStatus, ExchangeRate, PriceTier, Product, RawListing};
use crate::storage::schema::{initialize_schema, verify_schema};
use crate::storage::traits::{ProductStore, StorageError, StorageResult};
use crate::storage::LoadMode;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use crate::transform::PRICE_SCALE;
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const PRODUCT_COLUMNS: &str = "product_id, title, price_source, price_target, category, \
     availability_status, stock_quantity, price_tier, scraped_at, updated_at";

const INSERT_PRODUCT_SQL: &str = "
    INSERT INTO products (product_id, title, price_source, price_target, category,
                          availability_status, stock_quantity, price_tier, scraped_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
";

// scraped_at and product_id are left alone on conflict
const UPSERT_PRODUCT_SQL: &str = "
    INSERT INTO products (product_id, title, price_source, price_target, category,
                          availability_status, stock_quantity, price_tier, scraped_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
    ON CONFLICT(product_id) DO UPDATE SET
        title = excluded.title,
        price_source = excluded.price_source,
        price_target = excluded.price_target,
        category = excluded.category,
        availability_status = excluded.availability_status,
        stock_quantity = excluded.stock_quantity,
        price_tier = excluded.price_tier,
        updated_at = excluded.updated_at
";

/// SQLite destination store
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens a store without touching its schema
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    /// * `write_timeout` - How long a write waits on a locked database
    pub fn open(path: &Path, write_timeout: Duration) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(write_timeout)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
        ",
        )?;

        Ok(Self { conn })
    }

    /// Opens the store named by the output configuration
    pub fn from_config(config: &OutputConfig) -> StorageResult<Self> {
        Self::open(
            Path::new(&config.database_path),
            Duration::from_secs(config.write_timeout_secs),
        )
    }

    /// Creates an in-memory database with the schema in place (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates any missing tables and indexes
    pub fn initialize(&self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    /// Fails with a schema mismatch if any expected table or column is absent
    pub fn verify(&self) -> StorageResult<()> {
        verify_schema(&self.conn)?;
        Ok(())
    }
}

impl ProductStore for SqliteStore {
    // ===== Products =====

    fn load_products(&mut self, products: &[Product], mode: LoadMode) -> StorageResult<usize> {
        let batch = distinct_by_id(products);
        let tx = self.conn.transaction()?;

        if mode == LoadMode::Replace {
            tx.execute("DELETE FROM products", [])?;
        }

        {
            let sql = match mode {
                LoadMode::Replace => INSERT_PRODUCT_SQL,
                LoadMode::Upsert => UPSERT_PRODUCT_SQL,
            };
            let mut stmt = tx.prepare(sql)?;

            for product in &batch {
                stmt.execute(params![
                    product.product_id,
                    product.title,
                    product.price_source.to_string(),
                    price_to_db(product.price_target),
                    product.category,
                    product.availability_status.to_db_string(),
                    product.stock_quantity,
                    product.price_tier.to_db_string(),
                    product.scraped_at.to_rfc3339(),
                    product.updated_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(batch.len())
    }

    fn get_product(&self, product_id: &str) -> StorageResult<Option<Product>> {
        let sql = format!("SELECT {} FROM products WHERE product_id = ?1", PRODUCT_COLUMNS);
        let product = self
            .conn
            .query_row(&sql, params![product_id], product_from_row)
            .optional()?;
        Ok(product)
    }

    fn list_products(&self) -> StorageResult<Vec<Product>> {
        let sql = format!("SELECT {} FROM products ORDER BY product_id", PRODUCT_COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let products = stmt
            .query_map([], product_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    // ===== Exchange Rates =====

    fn upsert_rate(&mut self, rate: &ExchangeRate) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO staging_exchange_rates
                 (date, base_currency, target_currency, exchange_rate, fetched_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(date, base_currency, target_currency) DO UPDATE SET
                 exchange_rate = excluded.exchange_rate,
                 fetched_at = excluded.fetched_at",
            params![
                rate.date.to_string(),
                rate.base_currency,
                rate.target_currency,
                rate.rate.to_string(),
                rate.fetched_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn latest_rate(&self, base: &str, target: &str) -> StorageResult<Option<ExchangeRate>> {
        let rate = self
            .conn
            .query_row(
                "SELECT date, base_currency, target_currency, exchange_rate, fetched_at
                 FROM staging_exchange_rates
                 WHERE base_currency = ?1 AND target_currency = ?2
                 ORDER BY date DESC, fetched_at DESC
                 LIMIT 1",
                params![base, target],
                |row| {
                    Ok(ExchangeRate {
                        date: date_from_db(0, &row.get::<_, String>(0)?)?,
                        base_currency: row.get(1)?,
                        target_currency: row.get(2)?,
                        rate: decimal_from_db(3, &row.get::<_, String>(3)?)?,
                        fetched_at: timestamp_from_db(4, &row.get::<_, String>(4)?)?,
                    })
                },
            )
            .optional()?;
        Ok(rate)
    }

    // ===== Raw Capture =====

    fn capture_raw(&mut self, listings: &[RawListing]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM raw_products", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO raw_products (title, price_source, category, availability, scraped_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for listing in listings {
                stmt.execute(params![
                    listing.title,
                    listing.price.to_string(),
                    listing.category,
                    listing.availability,
                    listing.scraped_at.to_rfc3339(),
                ])?;
            }
        }

        tx.commit()?;
        Ok(listings.len())
    }

    // ===== Statistics =====

    fn count_products(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_raw_listings(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM raw_products", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn count_by_tier(&self) -> StorageResult<HashMap<PriceTier, u64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT price_tier, COUNT(*) FROM products GROUP BY price_tier")?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (tier_str, count) = row?;
            if let Some(tier) = PriceTier::from_db_string(&tier_str) {
                counts.insert(tier, count as u64);
            }
        }

        Ok(counts)
    }

    fn count_by_availability(&self) -> StorageResult<HashMap<AvailabilityStatus, u64>> {
        let mut stmt = self.conn.prepare(
            "SELECT availability_status, COUNT(*) FROM products GROUP BY availability_status",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut counts = HashMap::new();
        for row in rows {
            let (status_str, count) = row?;
            if let Some(status) = AvailabilityStatus::from_db_string(&status_str) {
                counts.insert(status, count as u64);
            }
        }

        Ok(counts)
    }

    fn count_by_category(&self) -> StorageResult<Vec<(String, u64)>> {
        let query = "
            SELECT category, COUNT(*) as count
            FROM products
            GROUP BY category
            ORDER BY count DESC, category
        ";

        let mut stmt = self.conn.prepare(query)?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
        })?;

        let mut categories = Vec::new();
        for row in rows {
            categories.push(row?);
        }

        Ok(categories)
    }

    fn average_price_target(&self) -> StorageResult<Option<Decimal>> {
        let mut stmt = self.conn.prepare("SELECT price_target FROM products")?;
        let mut rows = stmt.query([])?;

        let mut total = Decimal::ZERO;
        let mut count: u64 = 0;
        while let Some(row) = rows.next()? {
            let price = decimal_from_db(0, &row.get::<_, String>(0)?)?;
            total = total.checked_add(price).ok_or_else(|| {
                StorageError::InvalidValue("price_target sum out of range".to_string())
            })?;
            count += 1;
        }

        if count == 0 {
            return Ok(None);
        }

        let average = total / Decimal::from(count);
        Ok(Some(average.round_dp_with_strategy(
            PRICE_SCALE,
            RoundingStrategy::MidpointAwayFromZero,
        )))
    }
}

/// Collapses repeated identifiers, keeping the last occurrence
///
/// Output follows the position of each identifier's first occurrence.
fn distinct_by_id(products: &[Product]) -> Vec<&Product> {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    let mut batch: Vec<&Product> = Vec::with_capacity(products.len());

    for product in products {
        match positions.get(product.product_id.as_str()).copied() {
            Some(at) => batch[at] = product,
            None => {
                positions.insert(product.product_id.as_str(), batch.len());
                batch.push(product);
            }
        }
    }

    if batch.len() < products.len() {
        tracing::warn!(
            "Batch repeats {} product identifier(s); keeping the last of each",
            products.len() - batch.len()
        );
    }

    batch
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    let status: String = row.get(5)?;
    let tier: String = row.get(7)?;

    Ok(Product {
        product_id: row.get(0)?,
        title: row.get(1)?,
        price_source: decimal_from_db(2, &row.get::<_, String>(2)?)?,
        price_target: decimal_from_db(3, &row.get::<_, String>(3)?)?,
        category: row.get(4)?,
        availability_status: AvailabilityStatus::from_db_string(&status)
            .ok_or_else(|| conversion_error(5, format!("unknown availability '{}'", status)))?,
        stock_quantity: row.get(6)?,
        price_tier: PriceTier::from_db_string(&tier)
            .ok_or_else(|| conversion_error(7, format!("unknown price tier '{}'", tier)))?,
        scraped_at: timestamp_from_db(8, &row.get::<_, String>(8)?)?,
        updated_at: timestamp_from_db(9, &row.get::<_, String>(9)?)?,
    })
}

/// Renders a converted price with exactly two fraction digits
fn price_to_db(value: Decimal) -> String {
    let rounded =
        value.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}

fn decimal_from_db(idx: usize, s: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_from_db(idx: usize, s: &str) -> rusqlite::Result<NaiveDate> {
    s.parse::<NaiveDate>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_from_db(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}
