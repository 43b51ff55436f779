use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::counter::{Counter, RecordingSpec};
use crate::level::{LogLevel, WindowKind};
use crate::queue::TaskQueue;
use crate::rolling::RollingWindowCounter;

/// A registered counter: plain or rolling.
#[derive(Clone)]
pub enum Statistic {
    Plain(Counter),
    Rolling(RollingWindowCounter),
}

impl Statistic {
    /// The plain counter state (the base of a rolling counter).
    pub fn counter(&self) -> &Counter {
        match self {
            Statistic::Plain(c) => c,
            Statistic::Rolling(r) => r.counter(),
        }
    }

    pub fn as_rolling(&self) -> Option<&RollingWindowCounter> {
        match self {
            Statistic::Plain(_) => None,
            Statistic::Rolling(r) => Some(r),
        }
    }

    pub fn is_rolling_capable(&self) -> bool {
        matches!(self, Statistic::Rolling(_))
    }

    pub fn name(&self) -> &str {
        self.counter().name()
    }

    pub fn count(&self) -> u64 {
        self.counter().count()
    }

    pub fn is_enabled(&self) -> bool {
        self.counter().is_enabled()
    }

    pub fn log_level(&self) -> LogLevel {
        self.counter().log_level()
    }

    pub fn increment(&self, delta: u64, recorded: Option<Value>) -> u64 {
        match self {
            Statistic::Plain(c) => c.increment(delta, recorded),
            Statistic::Rolling(r) => r.increment(delta, recorded),
        }
    }

    pub fn reset(&self) {
        match self {
            Statistic::Plain(c) => c.reset(),
            Statistic::Rolling(r) => r.reset(),
        }
    }

    pub fn enable(&self) -> bool {
        match self {
            Statistic::Plain(c) => c.enable(),
            Statistic::Rolling(r) => r.enable(),
        }
    }

    pub fn disable(&self) -> bool {
        match self {
            Statistic::Plain(c) => c.disable(),
            Statistic::Rolling(r) => r.disable(),
        }
    }

    pub fn enable_logging(&self) {
        self.counter().enable_logging();
    }

    pub fn disable_logging(&self) {
        self.counter().disable_logging();
    }
}

impl From<Counter> for Statistic {
    fn from(c: Counter) -> Self {
        Statistic::Plain(c)
    }
}

impl From<RollingWindowCounter> for Statistic {
    fn from(r: RollingWindowCounter) -> Self {
        Statistic::Rolling(r)
    }
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statistic::Plain(c) => fmt::Display::fmt(c, f),
            Statistic::Rolling(r) => fmt::Display::fmt(r, f),
        }
    }
}

impl fmt::Debug for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Everything needed to create a counter besides its name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterSpec {
    pub window: WindowKind,
    pub log_level: LogLevel,
    pub recording: Option<RecordingSpec>,
}

impl CounterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    pub fn log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn recording(mut self, recording: RecordingSpec) -> Self {
        self.recording = Some(recording);
        self
    }

    /// Build a rolling counter when a window is set, a plain one otherwise.
    pub fn build(&self, name: impl Into<String>, queue: Option<Arc<dyn TaskQueue>>) -> Statistic {
        match self.window {
            WindowKind::None => Statistic::Plain(Counter::with_options(
                name,
                self.log_level,
                self.recording.clone(),
            )),
            window => Statistic::Rolling(RollingWindowCounter::with_options(
                name,
                window,
                self.log_level,
                self.recording.clone(),
                queue,
            )),
        }
    }
}
