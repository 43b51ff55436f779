//! Per-target management registry.
//!
//! - `name -> Statistic` (first registration wins)
//! - composed attribute/operation name -> descriptor, rebuilt on add and on
//!   every state change that can alter visibility

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use dashmap::DashMap;
use serde_json::Value;

use statlens_core::error::{Result, StatsError};
use statlens_core::Statistic;

use crate::descriptor::{AttributeValue, BulkOperation, DescriptorTable, RegistryInfo};
use crate::target::TargetType;

pub struct ManagementRegistry {
    target: TargetType,
    address: String,
    stats: DashMap<String, Statistic>,
    table: RwLock<Arc<DescriptorTable>>,
    rebuild: Mutex<()>,
}

impl ManagementRegistry {
    pub fn new(target: TargetType, address: impl Into<String>) -> Self {
        let address = address.into();
        let table = DescriptorTable::build(&address, target.id(), &[]);
        Self {
            target,
            address,
            stats: DashMap::new(),
            table: RwLock::new(Arc::new(table)),
            rebuild: Mutex::new(()),
        }
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }

    /// Address the registry is published under.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    /// Counter names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.stats.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Insert `stat` under `name` unless the name is taken. Returns true when
    /// inserted; the descriptor table is rebuilt in that case.
    pub fn add_counter(&self, name: impl Into<String>, stat: Statistic) -> bool {
        let mut inserted = false;
        self.stats.entry(name.into()).or_insert_with(|| {
            inserted = true;
            stat
        });
        if inserted {
            self.republish();
        }
        inserted
    }

    pub fn statistic(&self, name: &str) -> Option<Statistic> {
        self.stats.get(name).map(|e| e.value().clone())
    }

    pub fn count(&self, name: &str) -> Option<u64> {
        self.stats.get(name).map(|e| e.value().count())
    }

    /// Increment a registered counter. `None` when the name is unknown.
    pub fn increment(&self, name: &str, delta: u64, recorded: Option<Value>) -> Option<u64> {
        let stat = self.statistic(name)?;
        Some(stat.increment(delta, recorded))
    }

    /// Read an attribute by composed name.
    pub fn attribute(&self, name: &str) -> Result<AttributeValue> {
        let entry = self
            .table()
            .attributes
            .get(name)
            .cloned()
            .ok_or_else(|| StatsError::NotFound(format!("unknown attribute: {name}")))?;
        let stat = self.statistic(&entry.counter).ok_or_else(|| {
            StatsError::NotFound(format!("could not find counter with name: {}", entry.counter))
        })?;
        entry
            .kind
            .value(&stat)
            .ok_or_else(|| StatsError::NotFound(format!("unknown attribute: {name}")))
    }

    /// Invoke an operation by composed name.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<()> {
        if let Some(op) = BulkOperation::from_name(name) {
            return op.apply(self, args);
        }

        let entry = self
            .table()
            .operations
            .get(name)
            .cloned()
            .ok_or_else(|| StatsError::NotFound(format!("could not {name}: unknown operation")))?;
        let stat = self.statistic(&entry.counter).ok_or_else(|| {
            StatsError::NotFound(format!("could not find counter with name: {}", entry.counter))
        })?;
        entry.kind.apply(&stat, args)?;
        if entry.kind.republishes() {
            self.republish();
        }
        Ok(())
    }

    /// Currently listed attributes and operations.
    pub fn info(&self) -> RegistryInfo {
        self.table().info.clone()
    }

    /// Rebuild the descriptor table from the current counters and their state.
    pub fn republish(&self) {
        let _guard = self.rebuild.lock().unwrap_or_else(PoisonError::into_inner);
        let stats = self.snapshot();
        let table = DescriptorTable::build(&self.address, self.target.id(), &stats);
        *self.table.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        tracing::debug!(registry = %self.address, counters = stats.len(), "descriptors rebuilt");
    }

    fn table(&self) -> Arc<DescriptorTable> {
        Arc::clone(&self.table.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clones of every counter, sorted by name.
    fn snapshot(&self) -> Vec<Statistic> {
        let mut stats: Vec<Statistic> = self.stats.iter().map(|e| e.value().clone()).collect();
        stats.sort_by(|a, b| a.name().cmp(b.name()));
        stats
    }

    pub fn reset(&self, name: &str) -> Result<()> {
        let stat = self.statistic(name).ok_or_else(|| {
            StatsError::NotFound(format!(
                "could not reset {name}: unable to find counter with name {name}"
            ))
        })?;
        tracing::debug!(registry = %self.address, counter = %name, "resetting");
        stat.reset();
        Ok(())
    }

    pub fn reset_all(&self) {
        tracing::debug!(registry = %self.address, "resetting all counters");
        self.snapshot().iter().for_each(Statistic::reset);
    }

    // The bulk operations below change what is visible, so each one ends
    // with a rebuild of the descriptor table.

    pub fn enable_all(&self) {
        tracing::debug!(registry = %self.address, "enabling all counters");
        for stat in self.snapshot() {
            stat.enable();
        }
        self.republish();
    }

    pub fn disable_all(&self) {
        tracing::debug!(registry = %self.address, "disabling all counters");
        for stat in self.snapshot() {
            stat.disable();
        }
        self.republish();
    }

    pub fn enable_all_logging(&self) {
        tracing::debug!(registry = %self.address, "enabling logging");
        self.snapshot().iter().for_each(Statistic::enable_logging);
        self.republish();
    }

    pub fn disable_all_logging(&self) {
        tracing::debug!(registry = %self.address, "disabling logging");
        self.snapshot().iter().for_each(Statistic::disable_logging);
        self.republish();
    }

    /// Set the window of every rolling counter; plain counters are skipped.
    pub fn set_time_window_for_all(&self, secs: i64) {
        tracing::debug!(registry = %self.address, secs, "setting time window for all counters");
        for stat in self.snapshot() {
            if let Some(r) = stat.as_rolling() {
                r.set_rolling_time_window(secs.saturating_mul(1000));
            }
        }
        self.republish();
    }

    /// Clean history and recompute the average of every actively rolling counter.
    pub fn update_rolling_for_all(&self) {
        for stat in self.snapshot() {
            if let Some(r) = stat.as_rolling().filter(|r| r.is_rolling()) {
                r.run_commands();
            }
        }
    }
}
