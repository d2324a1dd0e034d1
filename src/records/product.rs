//! Finalized catalog entries and their enumerated attributes
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stock status derived from the availability text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AvailabilityStatus {
    InStock,
    OutOfStock,
    /// No recognizable keyword in the availability text
    Unknown,
}

impl AvailabilityStatus {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::InStock => "IN_STOCK",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "IN_STOCK" => Some(Self::InStock),
            "OUT_OF_STOCK" => Some(Self::OutOfStock),
            "UNKNOWN" => Some(Self::Unknown),
            _ => None,
        }
    }

    /// All statuses, in display order
    pub fn all() -> [Self; 3] {
        [Self::InStock, Self::OutOfStock, Self::Unknown]
    }
}

impl fmt::Display for AvailabilityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InStock => "In Stock",
            Self::OutOfStock => "Out of Stock",
            Self::Unknown => "Unknown",
        };
        write!(f, "{}", s)
    }
}

/// Coarse band of the converted price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceTier {
    Cheap,
    Moderate,
    Expensive,
}

impl PriceTier {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Cheap => "CHEAP",
            Self::Moderate => "MODERATE",
            Self::Expensive => "EXPENSIVE",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "CHEAP" => Some(Self::Cheap),
            "MODERATE" => Some(Self::Moderate),
            "EXPENSIVE" => Some(Self::Expensive),
            _ => None,
        }
    }

    /// All tiers, cheapest first
    pub fn all() -> [Self; 3] {
        [Self::Cheap, Self::Moderate, Self::Expensive]
    }
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cheap => "Cheap",
            Self::Moderate => "Moderate",
            Self::Expensive => "Expensive",
        };
        write!(f, "{}", s)
    }
}

/// One finalized catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Hex SHA-256 of the listing's identifying fields
    pub product_id: String,
    pub title: String,
    /// Price in the source (base) currency
    pub price_source: Decimal,
    /// Price in the target currency, rounded to two fraction digits
    pub price_target: Decimal,
    pub category: String,
    pub availability_status: AvailabilityStatus,
    pub stock_quantity: u32,
    pub price_tier: PriceTier,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
