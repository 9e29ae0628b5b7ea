//! Error types for the infrastructure model.

use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while loading or mutating the infrastructure.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("unknown {kind}: {id}")]
    UnknownEntity { kind: &'static str, id: u32 },

    #[error("edge server {server} cannot host service {service}: insufficient capacity")]
    InsufficientCapacity { service: u32, server: u32 },

    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),
}
