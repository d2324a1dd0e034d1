use crate::records::ExchangeRate;
use crate::storage::LoadMode;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Outcome of one successful pipeline run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub listings_collected: usize,
    pub products_transformed: usize,
    pub records_dropped: usize,
    pub rows_loaded: usize,
    pub rate: ExchangeRate,
    pub load_mode: LoadMode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} listings collected, {} products transformed, {} dropped, {} rows loaded ({}) \
             at 1 {} = {} {} in {:.1}s",
            self.listings_collected,
            self.products_transformed,
            self.records_dropped,
            self.rows_loaded,
            self.load_mode,
            self.rate.base_currency,
            self.rate.rate,
            self.rate.target_currency,
            self.duration().num_milliseconds() as f64 / 1000.0
        )
    }
}
