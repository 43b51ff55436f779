//! Call-site increments.
//!
//! An [`IncrementSite`] describes one instrumented call: which target and
//! counter it feeds, how the counter is created on first use, and under which
//! outcome it fires. The caller evaluates its own condition and reports the
//! outcome through [`IncrementSite::hit`].

use serde_json::Value;

use statlens_core::CounterSpec;

use crate::catalog::StatisticsCatalog;
use crate::target::TargetType;

/// When a site counts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Trigger {
    /// Every call, whether it returned or failed.
    #[default]
    Always,
    /// Only calls that failed with this error kind.
    OnError(String),
}

/// How the instrumented call finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<'a> {
    Returned,
    Failed(&'a str),
}

impl Trigger {
    pub fn fires(&self, outcome: Outcome<'_>) -> bool {
        match (self, outcome) {
            (Trigger::Always, _) => true,
            (Trigger::OnError(kind), Outcome::Failed(failed)) => kind == failed,
            (Trigger::OnError(_), Outcome::Returned) => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IncrementSite {
    target: TargetType,
    counter: String,
    spec: CounterSpec,
    trigger: Trigger,
    amount: u64,
}

impl IncrementSite {
    pub fn new(target: TargetType, counter: impl Into<String>) -> Self {
        Self {
            target,
            counter: counter.into(),
            spec: CounterSpec::default(),
            trigger: Trigger::Always,
            amount: 1,
        }
    }

    pub fn spec(mut self, spec: CounterSpec) -> Self {
        self.spec = spec;
        self
    }

    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn amount(mut self, amount: u64) -> Self {
        self.amount = amount;
        self
    }

    pub fn target(&self) -> &TargetType {
        &self.target
    }

    pub fn counter(&self) -> &str {
        &self.counter
    }

    /// Create the site's counter ahead of the first hit.
    pub fn register(&self, catalog: &StatisticsCatalog) {
        catalog.initialise_with(&self.counter, &self.target, &self.spec);
    }

    /// Count one call. Returns whether the counter was incremented.
    pub fn hit(
        &self,
        catalog: &StatisticsCatalog,
        outcome: Outcome<'_>,
        condition: bool,
        recorded: Option<Value>,
    ) -> bool {
        if !condition || !self.trigger.fires(outcome) {
            return false;
        }
        catalog.increment_stats_with(self.amount, &self.counter, &self.target, &self.spec, recorded);
        true
    }
}
