//! Scheduler error types.

use edgesched_model::ModelError;
use edgesched_placement::PlacementError;
use thiserror::Error;

/// Errors that can occur while scheduling or running a simulation.
///
/// Unreachable locations and services without a feasible host are normal
/// scheduling outcomes and never show up here.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("placement error: {0}")]
    Placement(PlacementError),

    #[error("model error: {0}")]
    Model(ModelError),

    #[error("run failed at step {step}: {source}")]
    RunFailure {
        step: u64,
        #[source]
        source: Box<SchedulerError>,
    },
}

impl From<PlacementError> for SchedulerError {
    fn from(err: PlacementError) -> Self {
        match err {
            PlacementError::InvalidSnapshot(msg) => Self::InvalidSnapshot(msg),
            other => Self::Placement(other),
        }
    }
}

impl From<ModelError> for SchedulerError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidSnapshot(msg) => Self::InvalidSnapshot(msg),
            other => Self::Model(other),
        }
    }
}

impl SchedulerError {
    /// Wrap a tick failure with the step it happened on.
    pub fn at_step(self, step: u64) -> Self {
        match self {
            failure @ Self::RunFailure { .. } => failure,
            other => Self::RunFailure {
                step,
                source: Box::new(other),
            },
        }
    }
}

pub type SchedulerResult<T> = Result<T, SchedulerError>;
