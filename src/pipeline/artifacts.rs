//! JSON snapshots of stage outputs
//!
//! When `artifacts-dir` is set each run leaves `listings.json`, `rate.json`,
//! `products.json` and `summary.json` behind, overwriting the previous run's.

use crate::Result;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const LISTINGS_FILE: &str = "listings.json";
pub const RATE_FILE: &str = "rate.json";
pub const PRODUCTS_FILE: &str = "products.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Writes pretty-printed JSON files into one directory
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Creates the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Serializes `value` into `name` and returns the file's path
    pub fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<PathBuf> {
        let path = self.dir.join(name);
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    }
}
