//! Database schema definitions
//!
//! The DDL below is what `--init-db` runs. The loader never creates tables on
//! its own; a store whose tables or columns don't match surfaces
//! [`StorageError::SchemaMismatch`](crate::storage::StorageError::SchemaMismatch).
//!
//! Column policy for `products` in upsert mode:
//! - written once, kept on conflict: `product_id`, `scraped_at`
//! - overwritten every run: `title`, `price_source`, `price_target`,
//!   `category`, `availability_status`, `stock_quantity`, `price_tier`,
//!   `updated_at`
//!
//! Prices and rates are stored as TEXT so the exact decimal survives.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Daily exchange rates, one per date and currency pair
CREATE TABLE IF NOT EXISTS staging_exchange_rates (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    date TEXT NOT NULL,
    base_currency TEXT NOT NULL,
    target_currency TEXT NOT NULL,
    exchange_rate TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    UNIQUE(date, base_currency, target_currency)
);

-- Verbatim copy of the last collected listings
CREATE TABLE IF NOT EXISTS raw_products (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT,
    price_source TEXT,
    category TEXT,
    availability TEXT,
    scraped_at TEXT NOT NULL
);

-- Final catalog
CREATE TABLE IF NOT EXISTS products (
    product_id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    price_source TEXT NOT NULL,
    price_target TEXT NOT NULL,
    category TEXT NOT NULL,
    availability_status TEXT NOT NULL,
    stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0),
    price_tier TEXT NOT NULL,
    scraped_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_products_category ON products(category);
CREATE INDEX IF NOT EXISTS idx_products_price_tier ON products(price_tier);
"#;

/// Probe statements touching every column the pipeline reads or writes
pub const SCHEMA_PROBES: &[&str] = &[
    "SELECT date, base_currency, target_currency, exchange_rate, fetched_at
     FROM staging_exchange_rates LIMIT 0",
    "SELECT title, price_source, category, availability, scraped_at FROM raw_products LIMIT 0",
    "SELECT product_id, title, price_source, price_target, category, availability_status,
     stock_quantity, price_tier, scraped_at, updated_at FROM products LIMIT 0",
];

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Checks that every expected table and column exists
pub fn verify_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    for probe in SCHEMA_PROBES {
        conn.prepare(probe)?;
    }
    Ok(())
}
