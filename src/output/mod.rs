//! Output module for reporting on the loaded catalog
//!
//! This module handles:
//! - Loading catalog statistics from the destination store
//! - Rendering them for the `--stats` mode

pub mod stats;

pub use stats::{format_statistics, load_statistics, print_statistics, CatalogStatistics};
