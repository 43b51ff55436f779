//! Attribute and operation descriptors.
//!
//! The set of things a registry exposes per counter is small and closed, so each
//! kind is an enum variant carrying its composed name, accessor or mutator,
//! visibility predicate and parameter shape. A registry builds a lookup table
//! from these whenever its counters or their visible state change.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::Value;

use statlens_core::error::{Result, StatsError};
use statlens_core::Statistic;

use crate::registry::ManagementRegistry;

/// Value returned when reading an attribute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Integer(u64),
    Text(String),
    Values(Vec<Value>),
}

impl AttributeValue {
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttributeValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Declared parameter of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub description: &'static str,
}

const NO_PARAMS: &[ParamInfo] = &[];
const SECONDS: &[ParamInfo] = &[ParamInfo {
    name: "Seconds",
    type_name: "integer",
    description: "Time window in seconds",
}];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationInfo {
    pub name: String,
    pub description: String,
    pub params: Vec<ParamInfo>,
}

/// What a registry currently lists: only visible descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistryInfo {
    pub address: String,
    pub target: String,
    pub attributes: Vec<AttributeInfo>,
    pub operations: Vec<OperationInfo>,
}

impl RegistryInfo {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    pub fn has_operation(&self, name: &str) -> bool {
        self.operations.iter().any(|o| o.name == name)
    }
}

// --------------------
// Attributes
// --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Count,
    LoggingLevel,
    Recorded,
    RollingAvg,
    RollingAvgWindow,
}

impl AttributeKind {
    /// Attributes every counter has.
    pub const COMMON: [AttributeKind; 3] = [
        AttributeKind::Count,
        AttributeKind::LoggingLevel,
        AttributeKind::Recorded,
    ];
    /// Attributes only rolling counters have.
    pub const ROLLING: [AttributeKind; 2] = [AttributeKind::RollingAvg, AttributeKind::RollingAvgWindow];

    pub fn addendum(self, stat: &Statistic) -> String {
        match self {
            AttributeKind::Count => String::new(),
            AttributeKind::LoggingLevel => ": Logging Level".to_string(),
            AttributeKind::Recorded => {
                format!(": Recorded ({})", stat.counter().recording_label().unwrap_or(""))
            }
            AttributeKind::RollingAvg => ": Rolling Avg".to_string(),
            AttributeKind::RollingAvgWindow => ": Rolling Avg Window".to_string(),
        }
    }

    /// Externally visible name: bare counter name plus addendum.
    pub fn composed_name(self, stat: &Statistic) -> String {
        format!("{}{}", stat.name(), self.addendum(stat))
    }

    pub fn type_name(self) -> &'static str {
        match self {
            AttributeKind::Count | AttributeKind::RollingAvg => "integer",
            AttributeKind::LoggingLevel | AttributeKind::RollingAvgWindow => "string",
            AttributeKind::Recorded => "array",
        }
    }

    fn description(self, stat: &Statistic) -> String {
        let name = stat.name();
        match self {
            AttributeKind::Count => format!("{name}: number of increments"),
            AttributeKind::LoggingLevel => format!("{name}: logging level (DEBUG, INFO)"),
            AttributeKind::Recorded => format!("{name}: recorded values, oldest first"),
            AttributeKind::RollingAvg => {
                format!("{name}: increments per window on average since the window clock started")
            }
            AttributeKind::RollingAvgWindow => format!("{name}: rolling average window"),
        }
    }

    /// Current value, or `None` when the counter lacks the capability.
    pub fn value(self, stat: &Statistic) -> Option<AttributeValue> {
        let value = match self {
            AttributeKind::Count => AttributeValue::Integer(stat.count()),
            AttributeKind::LoggingLevel => AttributeValue::Text(stat.log_level().as_str().to_string()),
            AttributeKind::Recorded => AttributeValue::Values(stat.counter().recorded_history()),
            AttributeKind::RollingAvg => AttributeValue::Integer(stat.as_rolling()?.rolling_average()),
            AttributeKind::RollingAvgWindow => {
                AttributeValue::Text(format_millis(stat.as_rolling()?.rolling_time_window()))
            }
        };
        Some(value)
    }

    /// Whether the attribute is listed for the counter's current state.
    pub fn visible(self, stat: &Statistic) -> bool {
        match self {
            AttributeKind::Count => stat.is_enabled(),
            AttributeKind::LoggingLevel => stat.log_level() != statlens_core::LogLevel::None,
            AttributeKind::Recorded => stat.is_enabled() && stat.counter().is_recording(),
            AttributeKind::RollingAvg | AttributeKind::RollingAvgWindow => {
                stat.is_enabled() && stat.as_rolling().is_some_and(|r| r.is_rolling())
            }
        }
    }

    fn info(self, stat: &Statistic) -> AttributeInfo {
        AttributeInfo {
            name: self.composed_name(stat),
            type_name: self.type_name(),
            description: self.description(stat),
        }
    }
}

/// Human readable duration, e.g. `1h`, `1m 30s`, `250ms`.
pub fn format_millis(millis: i64) -> String {
    if millis <= 0 {
        return format!("{millis}ms");
    }
    const UNITS: [(i64, &str); 5] = [
        (86_400_000, "d"),
        (3_600_000, "h"),
        (60_000, "m"),
        (1_000, "s"),
        (1, "ms"),
    ];
    let mut rest = millis;
    let mut parts = Vec::new();
    for (size, unit) in UNITS {
        let n = rest / size;
        if n > 0 {
            parts.push(format!("{n}{unit}"));
            rest -= n * size;
        }
    }
    parts.join(" ")
}

// --------------------
// Per-counter operations
// --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Reset,
    Enable,
    Disable,
    EnableLogging,
    DisableLogging,
    EnableRolling,
    DisableRolling,
    SetTimeWindow,
}

impl OperationKind {
    pub const COMMON: [OperationKind; 5] = [
        OperationKind::Reset,
        OperationKind::Enable,
        OperationKind::Disable,
        OperationKind::EnableLogging,
        OperationKind::DisableLogging,
    ];
    pub const ROLLING: [OperationKind; 3] = [
        OperationKind::EnableRolling,
        OperationKind::DisableRolling,
        OperationKind::SetTimeWindow,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            OperationKind::Reset => "Reset",
            OperationKind::Enable => "Enable",
            OperationKind::Disable => "Disable",
            OperationKind::EnableLogging => "Enable Logging",
            OperationKind::DisableLogging => "Disable Logging",
            OperationKind::EnableRolling => "Enable Rolling",
            OperationKind::DisableRolling => "Disable Rolling",
            OperationKind::SetTimeWindow => "Set Time Window",
        }
    }

    /// `<Prefix>: <counter>`
    pub fn composed_name(self, counter: &str) -> String {
        format!("{}: {}", self.prefix(), counter)
    }

    pub fn params(self) -> &'static [ParamInfo] {
        match self {
            OperationKind::SetTimeWindow => SECONDS,
            _ => NO_PARAMS,
        }
    }

    fn description(self, counter: &str) -> String {
        match self {
            OperationKind::Reset => format!("Reset {counter} to zero"),
            OperationKind::Enable => format!("Enable and reset {counter}"),
            OperationKind::Disable => format!("Disable and reset {counter}"),
            OperationKind::EnableLogging => format!("Log {counter} on every increment"),
            OperationKind::DisableLogging => format!("Stop logging {counter}"),
            OperationKind::EnableRolling => format!("Start the rolling average for {counter}"),
            OperationKind::DisableRolling => format!("Stop the rolling average for {counter}"),
            OperationKind::SetTimeWindow => {
                format!("Set the rolling average window of {counter} and enable rolling")
            }
        }
    }

    pub fn visible(self, stat: &Statistic) -> bool {
        let window = stat.as_rolling().map(|r| r.rolling_time_window());
        match self {
            OperationKind::Reset | OperationKind::SetTimeWindow => true,
            OperationKind::Enable => !stat.is_enabled(),
            OperationKind::Disable => stat.is_enabled(),
            OperationKind::EnableLogging => stat.log_level() == statlens_core::LogLevel::None,
            OperationKind::DisableLogging => stat.log_level() != statlens_core::LogLevel::None,
            OperationKind::EnableRolling => window.is_some_and(|w| w <= 0),
            OperationKind::DisableRolling => window.is_some_and(|w| w > 0),
        }
    }

    /// Whether applying the operation can change which descriptors are visible.
    pub fn republishes(self) -> bool {
        !matches!(self, OperationKind::Reset)
    }

    /// Validate `args` and apply the operation to `stat`.
    pub fn apply(self, stat: &Statistic, args: &[Value]) -> Result<()> {
        let op = self.composed_name(stat.name());
        match self {
            OperationKind::Reset => {
                no_args(&op, args)?;
                stat.reset();
            }
            OperationKind::Enable => {
                no_args(&op, args)?;
                stat.enable();
            }
            OperationKind::Disable => {
                no_args(&op, args)?;
                stat.disable();
            }
            OperationKind::EnableLogging => {
                no_args(&op, args)?;
                stat.enable_logging();
            }
            OperationKind::DisableLogging => {
                no_args(&op, args)?;
                stat.disable_logging();
            }
            OperationKind::EnableRolling => {
                no_args(&op, args)?;
                rolling(&op, stat)?.enable_rolling();
            }
            OperationKind::DisableRolling => {
                no_args(&op, args)?;
                rolling(&op, stat)?.disable_rolling();
            }
            OperationKind::SetTimeWindow => {
                let secs = seconds_arg(&op, args)?;
                let r = rolling(&op, stat)?;
                r.set_rolling_time_window(secs.saturating_mul(1000));
                r.enable_rolling();
            }
        }
        Ok(())
    }

    fn info(self, counter: &str) -> OperationInfo {
        OperationInfo {
            name: self.composed_name(counter),
            description: self.description(counter),
            params: self.params().to_vec(),
        }
    }
}

// --------------------
// Registry-wide operations
// --------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BulkOperation {
    ResetAll,
    EnableAll,
    DisableAll,
    SetTimeWindowForAll,
    EnableAllLogging,
    DisableAllLogging,
}

impl BulkOperation {
    pub const ALL: [BulkOperation; 6] = [
        BulkOperation::ResetAll,
        BulkOperation::EnableAll,
        BulkOperation::DisableAll,
        BulkOperation::SetTimeWindowForAll,
        BulkOperation::EnableAllLogging,
        BulkOperation::DisableAllLogging,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BulkOperation::ResetAll => "Reset All",
            BulkOperation::EnableAll => "Enable All",
            BulkOperation::DisableAll => "Disable All",
            BulkOperation::SetTimeWindowForAll => "Set Time Window For All",
            BulkOperation::EnableAllLogging => "Enable All Logging",
            BulkOperation::DisableAllLogging => "Disable All Logging",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    pub fn params(self) -> &'static [ParamInfo] {
        match self {
            BulkOperation::SetTimeWindowForAll => SECONDS,
            _ => NO_PARAMS,
        }
    }

    fn description(self) -> &'static str {
        match self {
            BulkOperation::ResetAll => "Reset every counter",
            BulkOperation::EnableAll => "Enable and reset every counter",
            BulkOperation::DisableAll => "Disable and reset every counter",
            BulkOperation::SetTimeWindowForAll => "Set the rolling window of every rolling counter",
            BulkOperation::EnableAllLogging => "Log every counter on increment",
            BulkOperation::DisableAllLogging => "Stop logging every counter",
        }
    }

    pub fn apply(self, registry: &ManagementRegistry, args: &[Value]) -> Result<()> {
        let op = self.name();
        match self {
            BulkOperation::ResetAll => {
                no_args(op, args)?;
                registry.reset_all();
            }
            BulkOperation::EnableAll => {
                no_args(op, args)?;
                registry.enable_all();
            }
            BulkOperation::DisableAll => {
                no_args(op, args)?;
                registry.disable_all();
            }
            BulkOperation::SetTimeWindowForAll => {
                registry.set_time_window_for_all(seconds_arg(op, args)?);
            }
            BulkOperation::EnableAllLogging => {
                no_args(op, args)?;
                registry.enable_all_logging();
            }
            BulkOperation::DisableAllLogging => {
                no_args(op, args)?;
                registry.disable_all_logging();
            }
        }
        Ok(())
    }

    fn info(self) -> OperationInfo {
        OperationInfo {
            name: self.name().to_string(),
            description: self.description().to_string(),
            params: self.params().to_vec(),
        }
    }
}

fn no_args(op: &str, args: &[Value]) -> Result<()> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(StatsError::InvalidArgument(format!(
            "could not {op}: wrong number of params, expected 0, received {}",
            args.len()
        )))
    }
}

fn seconds_arg(op: &str, args: &[Value]) -> Result<i64> {
    match args {
        [v] => v.as_i64().ok_or_else(|| {
            StatsError::InvalidArgument(format!(
                "could not {op}: wrong param type, expected integer, received {}",
                json_type(v)
            ))
        }),
        _ => Err(StatsError::InvalidArgument(format!(
            "could not {op}: wrong number of params, expected 1, received {}",
            args.len()
        ))),
    }
}

fn rolling<'a>(op: &str, stat: &'a Statistic) -> Result<&'a statlens_core::RollingWindowCounter> {
    stat.as_rolling()
        .ok_or_else(|| StatsError::NotFound(format!("could not {op}: counter has no rolling average")))
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// --------------------
// Lookup table
// --------------------

#[derive(Debug, Clone)]
pub(crate) struct AttributeEntry {
    pub kind: AttributeKind,
    pub counter: String,
}

#[derive(Debug, Clone)]
pub(crate) struct OperationEntry {
    pub kind: OperationKind,
    pub counter: String,
}

/// Composed-name lookups plus the visible listing, built in one go and swapped
/// in whole.
#[derive(Debug, Default)]
pub(crate) struct DescriptorTable {
    pub attributes: HashMap<String, AttributeEntry>,
    pub operations: HashMap<String, OperationEntry>,
    pub info: RegistryInfo,
}

impl DescriptorTable {
    /// `stats` must be sorted by name so listings are deterministic.
    pub fn build(address: &str, target: &str, stats: &[Statistic]) -> Self {
        let mut table = DescriptorTable {
            info: RegistryInfo {
                address: address.to_string(),
                target: target.to_string(),
                ..RegistryInfo::default()
            },
            ..DescriptorTable::default()
        };

        for stat in stats {
            let name = stat.name();
            let rolling_capable = stat.is_rolling_capable();

            let recording = stat.counter().is_recording();
            let attrs = AttributeKind::COMMON
                .iter()
                .filter(|k| **k != AttributeKind::Recorded || recording)
                .chain(AttributeKind::ROLLING.iter().filter(|_| rolling_capable));
            for &kind in attrs {
                if kind.visible(stat) {
                    table.info.attributes.push(kind.info(stat));
                }
                table.attributes.insert(
                    kind.composed_name(stat),
                    AttributeEntry { kind, counter: name.to_string() },
                );
            }

            let ops = OperationKind::COMMON
                .iter()
                .chain(OperationKind::ROLLING.iter().filter(|_| rolling_capable));
            for &kind in ops {
                if kind.visible(stat) {
                    table.info.operations.push(kind.info(name));
                }
                table.operations.insert(
                    kind.composed_name(name),
                    OperationEntry { kind, counter: name.to_string() },
                );
            }
        }

        table
            .info
            .operations
            .extend(BulkOperation::ALL.iter().map(|op| op.info()));
        table
    }
}
