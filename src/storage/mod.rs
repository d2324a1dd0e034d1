//! Storage module for persisting pipeline output
//!
//! This module handles all database operations for the pipeline, including:
//! - Schema creation for a fresh destination store
//! - Atomic replace and keyed upsert of the product catalog
//! - Daily exchange rate staging
//! - Raw listing capture
//! - Catalog statistics

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, verify_schema, SCHEMA_SQL};
pub use sqlite::SqliteStore;
pub use traits::{ProductStore, StorageError, StorageResult};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a batch of products is written to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadMode {
    /// The table ends up holding exactly the batch
    #[default]
    Replace,
    /// Rows are merged by product identifier
    Upsert,
}

impl LoadMode {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Upsert => "upsert",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(Self::Replace),
            "upsert" => Some(Self::Upsert),
            _ => None,
        }
    }
}

impl fmt::Display for LoadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

impl FromStr for LoadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db_string(&s.to_ascii_lowercase())
            .ok_or_else(|| format!("unknown load mode '{}' (expected replace or upsert)", s))
    }
}
