//! Counter with a time-bucketed history and a windowed average.
//!
//! Every increment while rolling appends `(timestamp, cumulative count)` to an
//! ordered history. Entries older than one window behind the newest are pruned
//! from the front, and the average is recomputed as the count divided by the
//! number of whole windows since `start`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::clock::now_millis;
use crate::counter::{Counter, RecordingSpec};
use crate::level::{LogLevel, WindowKind};
use crate::lock;
use crate::queue::TaskQueue;

struct RollingInner {
    base: Counter,
    window: WindowKind,
    window_ms: AtomicI64,
    rolling_enabled: AtomicBool,
    start_ms: AtomicU64,
    history: Mutex<BTreeMap<u64, u64>>,
    rolling_avg: AtomicU64,
    queue: Option<Arc<dyn TaskQueue>>,
}

/// Shared handle to a rolling-average counter. Clones point at the same state.
#[derive(Clone)]
pub struct RollingWindowCounter {
    inner: Arc<RollingInner>,
}

impl RollingWindowCounter {
    pub fn new(name: impl Into<String>, window: WindowKind) -> Self {
        Self::with_options(name, window, LogLevel::None, None, None)
    }

    /// `queue`, when given, receives the clean/average jobs instead of the
    /// incrementing thread running them.
    pub fn with_options(
        name: impl Into<String>,
        window: WindowKind,
        log_level: LogLevel,
        recording: Option<RecordingSpec>,
        queue: Option<Arc<dyn TaskQueue>>,
    ) -> Self {
        let rolling = window != WindowKind::None;
        Self {
            inner: Arc::new(RollingInner {
                base: Counter::with_options(name, log_level, recording),
                window,
                window_ms: AtomicI64::new(window.millis()),
                rolling_enabled: AtomicBool::new(rolling),
                start_ms: AtomicU64::new(now_millis()),
                history: Mutex::new(BTreeMap::new()),
                rolling_avg: AtomicU64::new(0),
                queue,
            }),
        }
    }

    /// The underlying plain counter.
    pub fn counter(&self) -> &Counter {
        &self.inner.base
    }

    pub fn name(&self) -> &str {
        self.inner.base.name()
    }

    pub fn count(&self) -> u64 {
        self.inner.base.count()
    }

    pub fn window_kind(&self) -> WindowKind {
        self.inner.window
    }

    pub fn rolling_time_window(&self) -> i64 {
        self.inner.window_ms.load(Ordering::Acquire)
    }

    /// Change the window length. History is kept.
    pub fn set_rolling_time_window(&self, millis: i64) {
        self.inner.window_ms.store(millis, Ordering::Release);
    }

    pub fn is_rolling_enabled(&self) -> bool {
        self.inner.rolling_enabled.load(Ordering::Acquire)
    }

    /// Rolling is active only with the flag set and a positive window.
    pub fn is_rolling(&self) -> bool {
        self.is_rolling_enabled() && self.rolling_time_window() > 0
    }

    pub fn rolling_average(&self) -> u64 {
        self.inner.rolling_avg.load(Ordering::Acquire)
    }

    pub fn start_time_millis(&self) -> u64 {
        self.inner.start_ms.load(Ordering::Acquire)
    }

    /// Cumulative counts in the history, oldest to newest.
    pub fn historic_values(&self) -> Vec<u64> {
        lock(&self.inner.history).values().copied().collect()
    }

    pub fn increment(&self, delta: u64, recorded: Option<Value>) -> u64 {
        self.increment_at(now_millis(), delta, recorded)
    }

    /// Increment as if it happened at `now` (ms since epoch).
    pub fn increment_at(&self, now: u64, delta: u64, recorded: Option<Value>) -> u64 {
        if !self.inner.base.is_enabled() {
            return 0;
        }
        let count = self.inner.base.increment(delta, recorded);
        if self.is_rolling() {
            lock(&self.inner.history)
                .entry(now)
                .and_modify(|v| *v = (*v).max(count))
                .or_insert(count);
            self.run_commands_at(now);
        }
        count
    }

    /// Clean the history and recompute the average, on the task queue if one
    /// is configured, otherwise on this thread.
    pub fn run_commands(&self) {
        self.run_commands_at(now_millis());
    }

    fn run_commands_at(&self, now: u64) {
        let Some(queue) = &self.inner.queue else {
            self.clean_history_to_window();
            self.calculate_average(now);
            return;
        };

        let this = self.clone();
        let job = Box::new(move || {
            this.clean_history_to_window();
            this.calculate_average(now);
        });
        if let Err(job) = queue.submit(job) {
            job();
        }
    }

    /// Drop entries older than one window behind the newest entry.
    pub fn clean_history_to_window(&self) {
        let newest = lock(&self.inner.history).keys().next_back().copied();
        if let Some(newest) = newest {
            let expiry = newest as i64 - self.rolling_time_window();
            self.clean_history(expiry);
        }
    }

    /// Remove history entries with a timestamp before `expiry` (ms). Stops at
    /// the first entry that has not expired.
    pub fn clean_history(&self, expiry: i64) {
        let mut history = lock(&self.inner.history);
        let before = history.len();
        if expiry > 0 {
            let keep = history.split_off(&(expiry as u64));
            *history = keep;
        }
        let cleaned = before - history.len();
        drop(history);
        if cleaned > 0 {
            tracing::debug!(counter = %self.name(), cleaned, "cleaned history");
        }
    }

    /// Recompute the average as of `at` (ms since epoch).
    ///
    /// During the first window the period count is clamped to 1, so the value
    /// is a cumulative running average until a full window has elapsed.
    pub fn calculate_average(&self, at: u64) {
        let window = self.rolling_time_window();
        let periods = if window > 0 {
            let elapsed = at as i64 - self.start_time_millis() as i64;
            elapsed.div_euclid(window)
        } else {
            0
        };
        let periods = periods.max(1) as f64;
        let count = self.count();
        let avg = (count as f64 / periods).round() as u64;
        tracing::debug!(counter = %self.name(), count, periods, avg, "calculated average");
        self.inner.rolling_avg.store(avg, Ordering::Release);
    }

    /// Returns true when rolling transitioned from disabled.
    pub fn enable_rolling(&self) -> bool {
        let changed = self
            .inner
            .rolling_enabled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.reset_rolling();
        }
        changed
    }

    /// Returns true when rolling transitioned from enabled. Accumulated history
    /// is dropped.
    pub fn disable_rolling(&self) -> bool {
        let changed = self
            .inner
            .rolling_enabled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if changed {
            self.reset_rolling();
        }
        changed
    }

    /// Clear history, zero the average and restart the window clock.
    pub fn reset_rolling(&self) {
        lock(&self.inner.history).clear();
        self.inner.rolling_avg.store(0, Ordering::Release);
        self.inner.start_ms.store(now_millis(), Ordering::Release);
    }

    pub fn reset(&self) {
        self.inner.base.reset();
        self.reset_rolling();
    }

    pub fn enable(&self) -> bool {
        let changed = self.inner.base.enable();
        if changed {
            self.reset_rolling();
        }
        changed
    }

    pub fn disable(&self) -> bool {
        let changed = self.inner.base.disable();
        if changed {
            self.reset_rolling();
        }
        changed
    }
}

impl fmt::Display for RollingWindowCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RollingWindowCounter [name={}, count={}, rollingAvg={}, window={}, windowMs={}, enabled={}, rollingEnabled={}, logLevel={}]",
            self.name(),
            self.count(),
            self.rolling_average(),
            self.window_kind(),
            self.rolling_time_window(),
            self.inner.base.is_enabled(),
            self.is_rolling_enabled(),
            self.inner.base.log_level()
        )
    }
}

impl fmt::Debug for RollingWindowCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
