//! Strategy contract and the named strategy registry.
//!
//! A strategy is invoked once per tick with mutable access to the
//! infrastructure. It may only change placements through
//! `Infrastructure::provision`, and reports what it did in a
//! [`TickSummary`].

use std::collections::BTreeMap;

use edgesched_model::{Infrastructure, ServerId, ServiceId};
use serde::{Deserialize, Serialize};

use crate::agents::MultiAgentStrategy;
use crate::error::{SchedulerError, SchedulerResult};
use crate::thea::TheaStrategy;

/// One placement change made during a tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Commit {
    pub service: ServiceId,
    pub server: ServerId,
    pub origin: Option<ServerId>,
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TickSummary {
    pub step: u64,
    /// Commits in the order they were applied.
    pub commits: Vec<Commit>,
    /// Services considered this tick that are still without a host.
    pub unplaced: Vec<ServiceId>,
}

/// A per-tick placement strategy.
pub trait PlacementStrategy {
    /// Registered name.
    fn name(&self) -> &str;

    /// Called once before the first tick of a run. Discards run-scoped state.
    fn begin_run(&mut self, infra: &Infrastructure);

    /// Make this tick's placement decisions.
    fn on_tick(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<TickSummary>;
}

type StrategyBuilder = Box<dyn Fn() -> Box<dyn PlacementStrategy> + Send + Sync>;

/// Name → strategy constructor. Each run gets a fresh instance.
pub struct StrategyRegistry {
    builders: BTreeMap<String, StrategyBuilder>,
}

impl StrategyRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            builders: BTreeMap::new(),
        }
    }

    /// Registry with `"thea"` and `"smms"`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TheaStrategy::NAME, || Box::new(TheaStrategy::new()));
        registry.register(MultiAgentStrategy::NAME, || {
            Box::new(MultiAgentStrategy::passive())
        });
        registry
    }

    /// Register (or replace) a strategy under `name`.
    pub fn register<F>(&mut self, name: &str, builder: F)
    where
        F: Fn() -> Box<dyn PlacementStrategy> + Send + Sync + 'static,
    {
        self.builders.insert(name.to_ascii_lowercase(), Box::new(builder));
    }

    /// Build a fresh instance of the named strategy. Names are case-insensitive.
    pub fn create(&self, name: &str) -> SchedulerResult<Box<dyn PlacementStrategy>> {
        self.builders
            .get(&name.to_ascii_lowercase())
            .map(|build| build())
            .ok_or_else(|| SchedulerError::UnknownStrategy(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(&name.to_ascii_lowercase())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.builders.keys().map(String::as_str).collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
