//! Process-wide statistics catalog.
//!
//! Maps each target type to its management registry, creating registries and
//! counters on first use. Increments for a target that was never initialised
//! create the registry on the fly; increments for an unknown counter inside a
//! known registry are logged and dropped.

use std::sync::{Arc, Mutex, OnceLock, PoisonError, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;

use statlens_core::error::{Result, StatsError};
use statlens_core::{CounterSpec, LogLevel, Statistic, TaskQueue, WindowKind};

use crate::config::{CatalogSection, StatsConfig};
use crate::publish::{NoopPublisher, Publisher};
use crate::registry::ManagementRegistry;
use crate::target::TargetType;
use crate::worker::BackgroundWorker;

pub const DEFAULT_LOG_FORMAT: &str = "Statistic logging: {name} = {state}";
pub const DEFAULT_ADDRESS_SUFFIX: &str = ".stats";

const WORKER_THREAD_NAME: &str = "statlens-worker";

static GLOBAL: OnceLock<Arc<StatisticsCatalog>> = OnceLock::new();

pub struct StatisticsCatalog {
    registries: DashMap<TargetType, Arc<ManagementRegistry>>,
    publisher: Arc<dyn Publisher>,
    worker: Option<BackgroundWorker>,
    worker_thread: Mutex<Option<JoinHandle<()>>>,
    log_format: String,
    address_suffix: String,
}

impl Default for StatisticsCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl StatisticsCatalog {
    /// Catalog without a background worker, publishing nowhere.
    pub fn new() -> Self {
        Self {
            registries: DashMap::new(),
            publisher: Arc::new(NoopPublisher),
            worker: None,
            worker_thread: Mutex::new(None),
            log_format: DEFAULT_LOG_FORMAT.to_string(),
            address_suffix: DEFAULT_ADDRESS_SUFFIX.to_string(),
        }
    }

    pub fn with_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Run rolling-average maintenance on a dedicated thread.
    pub fn with_background_worker(mut self) -> Result<Self> {
        let (worker, handle) = BackgroundWorker::spawn(WORKER_THREAD_NAME)?;
        self.worker = Some(worker);
        self.worker_thread = Mutex::new(Some(handle));
        Ok(self)
    }

    /// Format of the per-increment log line; `{name}` and `{state}` are
    /// substituted.
    pub fn with_log_format(mut self, format: impl Into<String>) -> Self {
        self.log_format = format.into();
        self
    }

    pub fn with_address_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.address_suffix = suffix.into();
        self
    }

    fn apply_section(self, section: &CatalogSection) -> Result<Self> {
        let catalog = self
            .with_log_format(section.log_format.clone())
            .with_address_suffix(section.address_suffix.clone());
        if section.background_worker {
            catalog.with_background_worker()
        } else {
            Ok(catalog)
        }
    }

    /// Build a catalog from config and initialise its seed counters.
    pub fn from_config(cfg: &StatsConfig, publisher: Arc<dyn Publisher>) -> Result<Self> {
        cfg.validate()?;
        let catalog = Self::new().with_publisher(publisher).apply_section(&cfg.catalog)?;
        for seed in &cfg.counters {
            catalog.initialise_with(&seed.name, &seed.target_type(), &seed.spec());
        }
        tracing::info!(
            registries = catalog.registries.len(),
            counters = cfg.counters.len(),
            worker = catalog.worker.is_some(),
            "statistics catalog initialised"
        );
        Ok(catalog)
    }

    /// Process-wide catalog. Defaults to [`StatisticsCatalog::new`] unless
    /// [`StatisticsCatalog::install_global`] ran first.
    pub fn global() -> Arc<StatisticsCatalog> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(StatisticsCatalog::new())))
    }

    /// Install `catalog` as the process-wide catalog. Fails once one exists.
    pub fn install_global(catalog: Arc<StatisticsCatalog>) -> Result<()> {
        GLOBAL
            .set(catalog)
            .map_err(|_| StatsError::Internal("global statistics catalog already installed".into()))
    }

    pub fn log_format(&self) -> &str {
        &self.log_format
    }

    pub fn background_worker(&self) -> Option<&BackgroundWorker> {
        self.worker.as_ref()
    }

    fn queue(&self) -> Option<Arc<dyn TaskQueue>> {
        self.worker
            .as_ref()
            .map(|w| Arc::new(w.clone()) as Arc<dyn TaskQueue>)
    }

    pub fn registry(&self, target: &TargetType) -> Option<Arc<ManagementRegistry>> {
        self.registries.get(target).map(|e| Arc::clone(e.value()))
    }

    /// Every registry, sorted by address.
    pub fn registries(&self) -> Vec<Arc<ManagementRegistry>> {
        let mut out: Vec<_> = self.registries.iter().map(|e| Arc::clone(e.value())).collect();
        out.sort_by(|a, b| a.address().cmp(b.address()));
        out
    }

    /// Registry for `target` under the default address, created if absent.
    pub fn registry_for(&self, target: &TargetType) -> Arc<ManagementRegistry> {
        self.ensure_registry(target, || target.default_address(&self.address_suffix), None)
    }

    /// Registry for `target` under an explicit domain, created if absent. An
    /// existing registry keeps its address.
    pub fn create_registry(&self, domain: &str, target: &TargetType) -> Arc<ManagementRegistry> {
        self.ensure_registry(target, || target.address_in(domain), None)
    }

    /// A new registry enters the map already holding `first`, so a concurrent
    /// caller never sees it without that counter.
    fn ensure_registry(
        &self,
        target: &TargetType,
        address: impl FnOnce() -> String,
        first: Option<(&str, &CounterSpec)>,
    ) -> Arc<ManagementRegistry> {
        let mut created = false;
        let registry = self
            .registries
            .entry(target.clone())
            .or_insert_with(|| {
                created = true;
                let registry = ManagementRegistry::new(target.clone(), address());
                if let Some((name, spec)) = first {
                    registry.add_counter(name, spec.build(name, self.queue()));
                }
                Arc::new(registry)
            })
            .value()
            .clone();
        if created {
            tracing::debug!(target_type = %target, registry = %registry.address(), "created registry");
            self.publish(&registry);
        }
        registry
    }

    fn publish(&self, registry: &Arc<ManagementRegistry>) {
        if let Err(e) = self.publisher.publish(Arc::clone(registry)) {
            tracing::warn!(
                registry = %registry.address(),
                target_type = %registry.target(),
                error = %e,
                "registry could not be published"
            );
        }
    }

    /// Create the counter `name` for `target` unless it exists. A window other
    /// than `None` makes it a rolling counter.
    pub fn initialise_stats(
        &self,
        name: &str,
        target: &TargetType,
        window: Option<WindowKind>,
        log_level: Option<LogLevel>,
    ) -> Arc<ManagementRegistry> {
        let spec = CounterSpec::new()
            .window(window.unwrap_or_default())
            .log_level(log_level.unwrap_or_default());
        self.initialise_with(name, target, &spec)
    }

    pub fn initialise_with(
        &self,
        name: &str,
        target: &TargetType,
        spec: &CounterSpec,
    ) -> Arc<ManagementRegistry> {
        tracing::debug!(
            target_type = %target,
            counter = %name,
            window = %spec.window,
            log_level = %spec.log_level,
            "initialising"
        );
        let registry = self.ensure_registry(
            target,
            || target.default_address(&self.address_suffix),
            Some((name, spec)),
        );
        if registry.statistic(name).is_none()
            && registry.add_counter(name, spec.build(name, self.queue()))
        {
            tracing::debug!(registry = %registry.address(), counter = %name, "counter added");
        }
        registry
    }

    /// Increment `name` on `target` by `amount`.
    ///
    /// A target never seen before is initialised with defaults first. A
    /// counter missing from an existing registry is logged and skipped.
    pub fn increment_stats(
        &self,
        amount: u64,
        name: &str,
        target: &TargetType,
        recorded: Option<Value>,
    ) -> Arc<ManagementRegistry> {
        let registry = match self.registry(target) {
            Some(r) => r,
            None => self.initialise_stats(name, target, None, None),
        };
        self.increment_in(&registry, amount, name, recorded);
        registry
    }

    /// Like [`increment_stats`](Self::increment_stats) but creates a missing
    /// counter from `spec` instead of skipping it.
    pub fn increment_stats_with(
        &self,
        amount: u64,
        name: &str,
        target: &TargetType,
        spec: &CounterSpec,
        recorded: Option<Value>,
    ) -> Arc<ManagementRegistry> {
        let registry = self.initialise_with(name, target, spec);
        self.increment_in(&registry, amount, name, recorded);
        registry
    }

    fn increment_in(
        &self,
        registry: &ManagementRegistry,
        amount: u64,
        name: &str,
        recorded: Option<Value>,
    ) -> Option<u64> {
        let Some(stat) = registry.statistic(name) else {
            tracing::error!(
                target_type = %registry.target(),
                counter = %name,
                "failed to increment: counter not found, check that it has been initialised"
            );
            return None;
        };
        let count = stat.increment(amount, recorded);
        self.log_increment(registry, &stat);
        Some(count)
    }

    fn log_increment(&self, registry: &ManagementRegistry, stat: &Statistic) {
        let level = stat.log_level();
        if level == LogLevel::None {
            return;
        }
        let message = self
            .log_format
            .replace("{name}", stat.name())
            .replace("{state}", &stat.to_string());
        match level {
            LogLevel::Debug => tracing::debug!(registry = %registry.address(), "{message}"),
            _ => tracing::info!(registry = %registry.address(), "{message}"),
        }
    }

    pub fn reset(&self, name: &str, target: &TargetType) -> Result<()> {
        match self.registry(target) {
            Some(registry) => registry.reset(name),
            None => {
                tracing::warn!(target_type = %target, "no registry found for reset");
                Ok(())
            }
        }
    }

    pub fn reset_all_for(&self, target: &TargetType) {
        match self.registry(target) {
            Some(registry) => registry.reset_all(),
            None => tracing::warn!(target_type = %target, "no registry found for reset"),
        }
    }

    pub fn reset_all(&self) {
        for registry in self.registries() {
            registry.reset_all();
        }
    }

    pub fn update_rolling_for_all(&self) {
        for registry in self.registries() {
            registry.update_rolling_for_all();
        }
    }

    /// Periodically refresh rolling averages so they decay when increments
    /// stop. Stops once the catalog is dropped. Requires a tokio runtime.
    pub fn spawn_average_refresh(self: &Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        let catalog: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(period);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let Some(catalog) = catalog.upgrade() else { break };
                catalog.update_rolling_for_all();
            }
        })
    }

    /// Unpublish every registry and stop the background worker, waiting for
    /// queued jobs to finish. Counters stay usable; rolling maintenance falls
    /// back to the caller's thread.
    pub fn shutdown(&self) {
        for registry in self.registries() {
            if let Err(e) = self.publisher.unpublish(registry.address()) {
                tracing::warn!(registry = %registry.address(), error = %e, "unpublish failed");
            }
        }
        if let Some(worker) = &self.worker {
            worker.close();
        }
        let handle = self
            .worker_thread
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                tracing::error!("background worker panicked");
            }
        }
        tracing::info!("statistics catalog shut down");
    }
}
