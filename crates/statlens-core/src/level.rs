//! Small closed enums shared by counters, config and descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Level at which a counter's state is logged on every increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    None,
    Debug,
    Info,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::None => "NONE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
        }
    }

    pub(crate) fn as_u8(self) -> u8 {
        match self {
            LogLevel::None => 0,
            LogLevel::Debug => 1,
            LogLevel::Info => 2,
        }
    }

    pub(crate) fn from_u8(v: u8) -> Self {
        match v {
            1 => LogLevel::Debug,
            2 => LogLevel::Info,
            _ => LogLevel::None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Width of the time bucket used for the rolling average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    #[default]
    None,
    Second,
    Minute,
    Hour,
    Day,
}

impl WindowKind {
    /// Window length in milliseconds (0 for `None`).
    pub fn millis(self) -> i64 {
        match self {
            WindowKind::None => 0,
            WindowKind::Second => 1_000,
            WindowKind::Minute => 60_000,
            WindowKind::Hour => 3_600_000,
            WindowKind::Day => 86_400_000,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WindowKind::None => "NONE",
            WindowKind::Second => "SECOND",
            WindowKind::Minute => "MINUTE",
            WindowKind::Hour => "HOUR",
            WindowKind::Day => "DAY",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
