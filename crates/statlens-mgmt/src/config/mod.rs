//! Catalog config loader.
//!
//! YAML only, unknown fields rejected, `version: 1` required. Every error
//! surfaces as `BAD_CONFIG` (or `UNSUPPORTED_VERSION`) so the binary can
//! report it before anything starts.

pub mod schema;

use std::fs;

use statlens_core::error::{Result, StatsError};

pub use schema::{CatalogSection, ConsoleSection, SeedCounter, StatsConfig};

pub fn load_from_file(path: &str) -> Result<StatsConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| StatsError::BadConfig(format!("read {path}: {e}")))?;
    load_from_str(&s).map_err(|e| match e {
        StatsError::BadConfig(msg) => StatsError::BadConfig(format!("{path}: {msg}")),
        other => other,
    })
}

/// Parse and validate a config document.
pub fn load_from_str(s: &str) -> Result<StatsConfig> {
    let cfg: StatsConfig = serde_yaml::from_str(s)
        .map_err(|e| StatsError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
