//! edgesched-model: in-memory edge infrastructure for the placement scheduler.
//!
//! Holds the entity model the scheduler reads each tick: users, multi-service
//! applications, services, edge servers and the delay-weighted network
//! topology. The model owns capacity bookkeeping and exposes a single
//! mutation, [`Infrastructure::provision`], which moves a service onto a
//! server.
//!
//! # Architecture
//!
//! ```text
//! Snapshot (serde JSON)
//!   └── Infrastructure::new (validate + index)
//!         ├── read accessors (users, applications, services, servers, topology)
//!         ├── provision (capacity + migration history)
//!         └── record_step → SimulationMetrics (Service / User / EdgeServer)
//! ```

pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod types;

pub use error::{ModelError, ModelResult};
pub use infrastructure::Infrastructure;
pub use metrics::{EdgeServerState, MigrationRecord, ServiceState, SimulationMetrics, UserState};
pub use types::*;
