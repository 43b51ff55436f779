use std::time::Duration;

use serde::Deserialize;
use statlens_core::error::{Result, StatsError};
use statlens_core::{CounterSpec, LogLevel, RecordingSpec, WindowKind, DEFAULT_MAX_RECORDINGS};

use crate::catalog::{DEFAULT_ADDRESS_SUFFIX, DEFAULT_LOG_FORMAT};
use crate::target::TargetType;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatsConfig {
    pub version: u32,

    #[serde(default)]
    pub catalog: CatalogSection,

    #[serde(default)]
    pub console: ConsoleSection,

    #[serde(default)]
    pub counters: Vec<SeedCounter>,
}

impl StatsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(StatsError::UnsupportedVersion);
        }

        self.catalog.validate()?;
        for (i, c) in self.counters.iter().enumerate() {
            c.validate()
                .map_err(|e| StatsError::BadConfig(format!("counters[{i}]: {e}")))?;
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogSection {
    #[serde(default = "default_background_worker")]
    pub background_worker: bool,

    #[serde(default = "default_log_format")]
    pub log_format: String,

    #[serde(default = "default_address_suffix")]
    pub address_suffix: String,

    /// 0 disables the periodic average refresh.
    #[serde(default)]
    pub refresh_interval_ms: u64,
}

impl Default for CatalogSection {
    fn default() -> Self {
        Self {
            background_worker: default_background_worker(),
            log_format: default_log_format(),
            address_suffix: default_address_suffix(),
            refresh_interval_ms: 0,
        }
    }
}

impl CatalogSection {
    pub fn validate(&self) -> Result<()> {
        if !self.log_format.contains("{name}") || !self.log_format.contains("{state}") {
            return Err(StatsError::BadConfig(
                "catalog.log_format must contain {name} and {state}".into(),
            ));
        }
        if self.address_suffix.contains([',', '=', ':', '*', '?']) {
            return Err(StatsError::BadConfig(
                "catalog.address_suffix must not contain , = : * ?".into(),
            ));
        }
        if self.refresh_interval_ms != 0 && !(100..=86_400_000).contains(&self.refresh_interval_ms) {
            return Err(StatsError::BadConfig(
                "catalog.refresh_interval_ms must be 0 or between 100 and 86400000".into(),
            ));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        (self.refresh_interval_ms > 0).then(|| Duration::from_millis(self.refresh_interval_ms))
    }
}

fn default_background_worker() -> bool {
    true
}
fn default_log_format() -> String {
    DEFAULT_LOG_FORMAT.into()
}
fn default_address_suffix() -> String {
    DEFAULT_ADDRESS_SUFFIX.into()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConsoleSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ConsoleSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:9810".into()
}

/// A counter created when the catalog starts.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedCounter {
    pub target: String,
    pub name: String,

    #[serde(default)]
    pub window: WindowKind,

    #[serde(default)]
    pub log_level: LogLevel,

    /// Label of the recorded-values attribute; absent means no recording.
    #[serde(default)]
    pub record: Option<String>,

    #[serde(default = "default_max_recordings")]
    pub max_recordings: usize,
}

impl SeedCounter {
    pub fn validate(&self) -> Result<()> {
        if self.target.trim().is_empty() {
            return Err(StatsError::BadConfig("target must not be empty".into()));
        }
        if self.name.trim().is_empty() {
            return Err(StatsError::BadConfig("name must not be empty".into()));
        }
        if !(1..=100_000).contains(&self.max_recordings) {
            return Err(StatsError::BadConfig(
                "max_recordings must be between 1 and 100000".into(),
            ));
        }
        Ok(())
    }

    pub fn target_type(&self) -> TargetType {
        TargetType::named(&self.target)
    }

    pub fn spec(&self) -> CounterSpec {
        let spec = CounterSpec::new().window(self.window).log_level(self.log_level);
        match &self.record {
            Some(label) => {
                spec.recording(RecordingSpec::new(label.clone()).with_capacity(self.max_recordings))
            }
            None => spec,
        }
    }
}

fn default_max_recordings() -> usize {
    DEFAULT_MAX_RECORDINGS
}
