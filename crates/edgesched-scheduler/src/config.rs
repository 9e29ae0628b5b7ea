//! Simulation run configuration (`simulation.toml`).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SchedulerError, SchedulerResult};

/// Strategy used when none is configured.
pub const DEFAULT_ALGORITHM: &str = "thea";

/// Step limit used when none is configured.
pub const DEFAULT_MAX_STEPS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    /// Registered strategy name.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Hard stop, even if services are still waiting for placement.
    #[serde(default = "default_max_steps")]
    pub max_steps: u64,
}

fn default_algorithm() -> String {
    DEFAULT_ALGORITHM.to_string()
}

fn default_max_steps() -> u64 {
    DEFAULT_MAX_STEPS
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            algorithm: default_algorithm(),
            max_steps: default_max_steps(),
        }
    }
}

impl SimulationConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulationConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> SchedulerResult<()> {
        if self.max_steps == 0 {
            return Err(SchedulerError::Config("max_steps must be at least 1".into()));
        }
        if self.algorithm.trim().is_empty() {
            return Err(SchedulerError::Config("algorithm must not be empty".into()));
        }
        Ok(())
    }
}
