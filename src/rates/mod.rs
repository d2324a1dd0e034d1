//! Exchange rate provider
//!
//! Produces a single validated `(date, base, target, rate)` quote per run.

mod provider;

pub use provider::RateProvider;
