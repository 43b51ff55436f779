//! statlens management library.
//!
//! Wires counters from `statlens-core` into per-target registries, keeps the
//! process-wide catalog, runs the background worker, and exposes registries
//! through a [`publish::Publisher`] (an HTTP console or nothing at all).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod catalog;
pub mod config;
pub mod console;
pub mod descriptor;
pub mod interceptor;
pub mod publish;
pub mod registry;
pub mod target;
pub mod telemetry;
pub mod worker;

pub use catalog::StatisticsCatalog;
pub use console::ConsolePublisher;
pub use interceptor::{IncrementSite, Outcome, Trigger};
pub use publish::{NoopPublisher, Publisher};
pub use registry::ManagementRegistry;
pub use target::TargetType;
