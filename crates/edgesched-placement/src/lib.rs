//! Placement heuristics for multi-service applications on edge servers.
//!
//! This crate decides where services go. It does NOT own the entity model
//! (that's `edgesched-model`) or the tick loop (that's
//! `edgesched-scheduler`). Every function reads an [`Infrastructure`]
//! snapshot; only [`placer::commit`] mutates it, through
//! [`Infrastructure::provision`].
//!
//! # Components
//!
//! - **`paths`**: Minimum-delay paths between switches, memoized per run
//! - **`normalize`**: Min–max normalization over a batch of metric records
//! - **`scorer`**: Application pressure and per-candidate host metrics
//! - **`ranking`**: Stable ordering of applications and host candidates
//! - **`placer`**: Commits a service to the first feasible ranked host
//!
//! [`Infrastructure`]: edgesched_model::Infrastructure
//! [`Infrastructure::provision`]: edgesched_model::Infrastructure::provision

pub mod error;
pub mod normalize;
pub mod paths;
pub mod placer;
pub mod ranking;
pub mod scorer;

pub use error::{PlacementError, PlacementResult};
pub use normalize::{BatchBounds, Bounds, MetricFields, min_max_norm};
pub use paths::{PathDelay, PathOracle, Route};
pub use placer::{CommitOutcome, commit};
pub use ranking::{RankedApplication, RankedCandidate, rank_applications, rank_candidates};
pub use scorer::{
    ApplicationField, ApplicationMetrics, CandidateField, CandidateMetrics, ChainPosition,
    application_metrics, chain_delay, chain_position, delay_score, host_candidates,
    privacy_score,
};
