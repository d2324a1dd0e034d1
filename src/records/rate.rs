use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fraction digits kept for a stored exchange rate
pub const RATE_SCALE: u32 = 6;

/// One daily quote for a currency pair
///
/// At most one rate is stored per `(date, base_currency, target_currency)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub date: NaiveDate,
    pub base_currency: String,
    pub target_currency: String,
    /// Units of target currency per one unit of base currency
    pub rate: Decimal,
    pub fetched_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Builds a rate, rounding the quote to [`RATE_SCALE`] fraction digits
    ///
    /// Returns `None` when the rounded quote is not strictly positive.
    pub fn new(
        date: NaiveDate,
        base_currency: impl Into<String>,
        target_currency: impl Into<String>,
        rate: Decimal,
        fetched_at: DateTime<Utc>,
    ) -> Option<Self> {
        let rate = rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero);
        if rate <= Decimal::ZERO {
            return None;
        }

        Some(Self {
            date,
            base_currency: base_currency.into(),
            target_currency: target_currency.into(),
            rate,
            fetched_at,
        })
    }

    /// Returns true if the rate can be used for conversion
    pub fn is_usable(&self) -> bool {
        self.rate > Decimal::ZERO
    }
}
