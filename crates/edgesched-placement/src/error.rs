//! Placement error types.

use edgesched_model::{ModelError, SwitchId};
use thiserror::Error;

/// Errors that abort a placement decision.
///
/// Unreachable switch pairs are not errors here; they surface as
/// [`PathDelay::Unreachable`](crate::paths::PathDelay::Unreachable).
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unknown network location: switch {0}")]
    UnknownLocation(SwitchId),

    #[error("provisioning failed: {0}")]
    Provision(ModelError),
}

impl From<ModelError> for PlacementError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::InvalidSnapshot(msg) => Self::InvalidSnapshot(msg),
            unknown @ ModelError::UnknownEntity { .. } => Self::InvalidSnapshot(unknown.to_string()),
            other => Self::Provision(other),
        }
    }
}

pub type PlacementResult<T> = Result<T, PlacementError>;
