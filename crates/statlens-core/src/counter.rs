//! Named atomic tally with an optional bounded history of recorded values.
//!
//! The count itself is a lock-free `AtomicU64`. The recording ring is a fixed
//! array guarded by a mutex because the slot write and the index advance must
//! happen together.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::level::LogLevel;
use crate::lock;

/// Ring capacity used when a recording is configured without one.
pub const DEFAULT_MAX_RECORDINGS: usize = 100;

/// What a counter records alongside each increment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSpec {
    /// Label describing the recorded values (shown in the attribute name).
    pub label: String,
    /// Number of most-recent values kept.
    pub capacity: usize,
}

impl RecordingSpec {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            capacity: DEFAULT_MAX_RECORDINGS,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }
}

struct Recording {
    label: String,
    ring: Mutex<Ring>,
}

struct Ring {
    slots: Vec<Option<Value>>,
    index: usize,
}

impl Ring {
    fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity.max(1)],
            index: 0,
        }
    }

    fn push(&mut self, value: Value) {
        if self.index == self.slots.len() {
            self.index = 0;
        }
        self.slots[self.index] = Some(value);
        self.index += 1;
    }

    /// Oldest to newest: `index..len` then `0..index`, empty slots skipped.
    fn ordered(&self) -> Vec<Value> {
        let (newer, older) = self.slots.split_at(self.index);
        older
            .iter()
            .chain(newer.iter())
            .filter_map(|v| v.clone())
            .collect()
    }

    fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

struct CounterInner {
    name: String,
    count: AtomicU64,
    enabled: AtomicBool,
    log_level: AtomicU8,
    recording: Option<Recording>,
}

/// Shared handle to one named counter. Clones point at the same state.
#[derive(Clone)]
pub struct Counter {
    inner: Arc<CounterInner>,
}

impl Counter {
    /// Plain counter: enabled, no logging, no recording.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_options(name, LogLevel::None, None)
    }

    pub fn with_options(
        name: impl Into<String>,
        log_level: LogLevel,
        recording: Option<RecordingSpec>,
    ) -> Self {
        let recording = recording.map(|spec| Recording {
            label: spec.label,
            ring: Mutex::new(Ring::new(spec.capacity)),
        });
        Self {
            inner: Arc::new(CounterInner {
                name: name.into(),
                count: AtomicU64::new(0),
                enabled: AtomicBool::new(true),
                log_level: AtomicU8::new(log_level.as_u8()),
                recording,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn count(&self) -> u64 {
        self.inner.count.load(Ordering::Acquire)
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    pub fn log_level(&self) -> LogLevel {
        LogLevel::from_u8(self.inner.log_level.load(Ordering::Relaxed))
    }

    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.log_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn enable_logging(&self) {
        self.set_log_level(LogLevel::Debug);
    }

    pub fn disable_logging(&self) {
        self.set_log_level(LogLevel::None);
    }

    pub fn is_recording(&self) -> bool {
        self.inner.recording.is_some()
    }

    /// Label of the recorded values, if recording is configured.
    pub fn recording_label(&self) -> Option<&str> {
        self.inner.recording.as_ref().map(|r| r.label.as_str())
    }

    /// Add `delta` and record `recorded`. Returns the new count, or 0 when
    /// the counter is disabled.
    pub fn increment(&self, delta: u64, recorded: Option<Value>) -> u64 {
        if !self.is_enabled() {
            return 0;
        }
        let count = self.inner.count.fetch_add(delta, Ordering::AcqRel) + delta;
        self.record(recorded);
        tracing::debug!(counter = %self.name(), count, "incremented");
        count
    }

    /// Store `value` in the ring, overwriting the oldest entry once full.
    pub fn record(&self, value: Option<Value>) {
        let (Some(rec), Some(value)) = (&self.inner.recording, value) else {
            return;
        };
        lock(&rec.ring).push(value);
    }

    /// Recorded values ordered oldest to newest.
    pub fn recorded_history(&self) -> Vec<Value> {
        match &self.inner.recording {
            Some(rec) => lock(&rec.ring).ordered(),
            None => Vec::new(),
        }
    }

    /// Returns true when the counter transitioned from disabled.
    pub fn enable(&self) -> bool {
        let changed = self
            .inner
            .enabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.reset();
        }
        changed
    }

    /// Returns true when the counter transitioned from enabled.
    pub fn disable(&self) -> bool {
        let changed = self
            .inner
            .enabled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.reset();
        }
        changed
    }

    /// Zero the count and clear every recorded slot.
    pub fn reset(&self) {
        tracing::debug!(counter = %self.name(), "reset");
        self.inner.count.store(0, Ordering::Release);
        if let Some(rec) = &self.inner.recording {
            lock(&rec.ring).clear();
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Counter [name={}, count={}, logLevel={}, enabled={}]",
            self.name(),
            self.count(),
            self.log_level(),
            self.is_enabled()
        )
    }
}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
