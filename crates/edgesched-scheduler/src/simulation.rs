//! Simulation runner: drives one strategy tick by tick over an infrastructure.
//!
//! A run stops at `max_steps` or as soon as no service is waiting for a host
//! (checked after each tick). Metrics are recorded after every tick.

use std::collections::BTreeMap;

use edgesched_model::{Infrastructure, SimulationMetrics, Snapshot};
use edgesched_placement::{PathOracle, chain_delay};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::SimulationConfig;
use crate::error::{SchedulerError, SchedulerResult};
use crate::strategy::{PlacementStrategy, StrategyRegistry, TickSummary};

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// SHA-256 of the input snapshot.
    pub run_id: String,
    pub algorithm: String,
    /// Ticks executed.
    pub steps: u64,
    /// Whether every service ended up with a host.
    pub completed: bool,
    pub ticks: Vec<TickSummary>,
    pub metrics: SimulationMetrics,
}

/// Stateless run driver.
pub struct Simulation;

impl Simulation {
    /// Run `strategy` over `infra` until every service is placed or
    /// `config.max_steps` ticks have passed.
    pub fn run(
        infra: &mut Infrastructure,
        strategy: &mut dyn PlacementStrategy,
        config: &SimulationConfig,
    ) -> SchedulerResult<SimulationReport> {
        config.validate()?;
        let run_id = infra.to_snapshot().digest()?;
        info!(
            run_id = %run_id,
            algorithm = strategy.name(),
            max_steps = config.max_steps,
            services = infra.services().len(),
            "simulation started"
        );

        strategy.begin_run(infra);
        let mut oracle = PathOracle::new(infra.topology());
        let mut metrics = SimulationMetrics::default();
        let mut ticks = Vec::new();
        let mut steps = 0;

        for step in 1..=config.max_steps {
            let summary = strategy
                .on_tick(infra, step)
                .map_err(|e| e.at_step(step))?;
            ticks.push(summary);

            let delays = chain_delays(infra, &mut oracle).map_err(|e| e.at_step(step))?;
            metrics
                .record_step(infra, step, &delays)
                .map_err(|e| SchedulerError::from(e).at_step(step))?;
            steps = step;

            if !infra.has_pending_services() {
                break;
            }
        }

        let completed = !infra.has_pending_services();
        if completed {
            info!(run_id = %run_id, steps, "simulation finished, every service placed");
        } else {
            warn!(
                run_id = %run_id,
                steps,
                pending = infra.pending_services().count(),
                "step limit reached with services still pending"
            );
        }

        Ok(SimulationReport {
            run_id,
            algorithm: strategy.name().to_string(),
            steps,
            completed,
            ticks,
            metrics,
        })
    }

    /// Validate `snapshot`, build the configured strategy and run it.
    pub fn run_snapshot(
        snapshot: Snapshot,
        registry: &StrategyRegistry,
        config: &SimulationConfig,
    ) -> SchedulerResult<(SimulationReport, Infrastructure)> {
        let mut infra = Infrastructure::new(snapshot)?;
        let mut strategy = registry.create(&config.algorithm)?;
        let report = Self::run(&mut infra, strategy.as_mut(), config)?;
        Ok((report, infra))
    }
}

fn chain_delays(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
) -> SchedulerResult<BTreeMap<u32, Option<f64>>> {
    let mut delays = BTreeMap::new();
    for app in infra.applications() {
        delays.insert(app.id, chain_delay(infra, oracle, app)?);
    }
    Ok(delays)
}
