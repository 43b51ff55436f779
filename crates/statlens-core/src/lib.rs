//! statlens core: runtime-free counter primitives, rolling averages, and the
//! shared error surface.
//!
//! This crate carries no runtime or transport dependencies. Background work is
//! delegated through the [`queue::TaskQueue`] seam so the management crate can
//! plug in its own worker.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here. Poisoned locks are
//! recovered rather than propagated: a counter must never take a caller down.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod clock;
pub mod counter;
pub mod error;
pub mod level;
pub mod queue;
pub mod rolling;
pub mod statistic;

pub use counter::{Counter, RecordingSpec, DEFAULT_MAX_RECORDINGS};
pub use error::{ErrorCode, Result, StatsError};
pub use level::{LogLevel, WindowKind};
pub use queue::{Job, TaskQueue};
pub use rolling::RollingWindowCounter;
pub use statistic::{CounterSpec, Statistic};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a mutex, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
