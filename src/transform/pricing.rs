//! Currency conversion and price tiering
//!
//! Conversion uses exact decimal arithmetic and rounds half away from zero to
//! two fraction digits, so 9.995 becomes 10.00.

use crate::config::PricingConfig;
use crate::records::PriceTier;
use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits kept for a converted price
pub const PRICE_SCALE: u32 = 2;

/// Converts a source price into the target currency
///
/// Returns `None` when the product doesn't fit in a `Decimal`.
pub fn convert_price(price_source: Decimal, rate: Decimal) -> Option<Decimal> {
    price_source
        .checked_mul(rate)
        .map(|p| p.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Tier boundaries in target currency
///
/// `price < cheap_below` is cheap, `cheap_below <= price < expensive_from` is
/// moderate, anything else is expensive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceThresholds {
    pub cheap_below: Decimal,
    pub expensive_from: Decimal,
}

impl PriceThresholds {
    pub fn from_config(config: &PricingConfig) -> Self {
        Self {
            cheap_below: config.cheap_below,
            expensive_from: config.expensive_from,
        }
    }

    pub fn classify(&self, price_target: Decimal) -> PriceTier {
        if price_target < self.cheap_below {
            PriceTier::Cheap
        } else if price_target < self.expensive_from {
            PriceTier::Moderate
        } else {
            PriceTier::Expensive
        }
    }
}
