//! Availability text parsing
//!
//! Turns strings such as "In stock (22 available)" into a status and a stock
//! quantity. Unrecognized text is never an error: it yields
//! [`AvailabilityStatus::Unknown`] with quantity 0.

use crate::records::AvailabilityStatus;
use regex::Regex;
use std::sync::OnceLock;

fn quantity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\((\d+)\s+available\)").expect("quantity pattern is valid")
    })
}

/// Parses availability text into a status and quantity
///
/// Status comes from keyword matching ("out of stock" is checked before
/// "in stock"); quantity comes from a "(N available)" fragment and is 0 when
/// absent or out of range.
pub fn parse_availability(text: &str) -> (AvailabilityStatus, u32) {
    let lowered = text.to_lowercase();

    let status = if lowered.contains("out of stock") {
        AvailabilityStatus::OutOfStock
    } else if lowered.contains("in stock") {
        AvailabilityStatus::InStock
    } else {
        AvailabilityStatus::Unknown
    };

    let quantity = quantity_pattern()
        .captures(text)
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(0);

    (status, quantity)
}
