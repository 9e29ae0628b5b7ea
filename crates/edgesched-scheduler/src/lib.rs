//! edgesched-scheduler: per-tick service placement over an edge simulation.
//!
//! The host calls a [`PlacementStrategy`] once per tick. Strategies are
//! looked up by name in a [`StrategyRegistry`]; [`Simulation`] drives a
//! whole run until every service is placed or the step limit is hit.
//!
//! # Architecture
//!
//! ```text
//! Simulation::run
//!   ├── PlacementStrategy::begin_run (reset run-scoped state)
//!   ├── per tick: PlacementStrategy::on_tick
//!   │     ├── "thea": TheaStrategy
//!   │     │     Scoring → Ranking → Committing (edgesched-placement)
//!   │     └── "smms": MultiAgentStrategy (one agent per service)
//!   └── per tick: SimulationMetrics::record_step
//! ```

pub mod agents;
pub mod config;
pub mod error;
pub mod simulation;
pub mod strategy;
pub mod thea;

pub use agents::{AgentFactory, MultiAgentStrategy, PassiveAgent, ServiceAgent};
pub use config::SimulationConfig;
pub use error::{SchedulerError, SchedulerResult};
pub use simulation::{Simulation, SimulationReport};
pub use strategy::{Commit, PlacementStrategy, StrategyRegistry, TickSummary};
pub use thea::{DriverPhase, TheaStrategy};
