//! Domain types for the edge infrastructure snapshot.
//!
//! A [`Snapshot`] is the serialized form of one simulation input: users,
//! their applications and services, the edge servers that may host them,
//! and the network topology connecting everything. All types round-trip
//! through JSON.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ModelResult;

/// Unique identifier for a user.
pub type UserId = u32;

/// Unique identifier for an application.
pub type ApplicationId = u32;

/// Unique identifier for a service.
pub type ServiceId = u32;

/// Unique identifier for an edge server.
pub type ServerId = u32;

/// Unique identifier for an infrastructure provider.
pub type ProviderId = u32;

/// Unique identifier for a network switch (a location in the topology).
pub type SwitchId = u32;

// ── User ──────────────────────────────────────────────────────────

/// A user running one or more applications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Switch the user's base station is attached to.
    pub base_switch: SwitchId,
    /// Maximum tolerated end-to-end delay per application.
    pub delay_slas: BTreeMap<ApplicationId, f64>,
    /// Trust placed in each infrastructure provider (0.0–1.0).
    pub providers_trust: BTreeMap<ProviderId, f64>,
}

// ── Application ───────────────────────────────────────────────────

/// A multi-service application. `services` is the chain order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Application {
    pub id: ApplicationId,
    pub user: UserId,
    pub services: Vec<ServiceId>,
}

// ── Service ───────────────────────────────────────────────────────

/// A single service of an application chain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub application: ApplicationId,
    pub cpu_demand: u32,
    pub memory_demand: u32,
    /// Minimum provider trust required to host this service (0.0–1.0).
    #[serde(default)]
    pub privacy_requirement: f64,
    /// Current host, if any.
    #[serde(default)]
    pub server: Option<ServerId>,
}

// ── Edge server ───────────────────────────────────────────────────

/// Parameters of the linear server power model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PowerModel {
    /// Fraction of `max_power_consumption` drawn while idle.
    pub static_power_percentage: f64,
    /// Power drawn at full CPU load.
    pub max_power_consumption: f64,
}

/// An edge server that can host services.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeServer {
    pub id: ServerId,
    pub provider: ProviderId,
    /// Total CPU capacity.
    pub cpu: u32,
    /// Total memory capacity.
    pub memory: u32,
    pub switch: SwitchId,
    pub power_model: PowerModel,
}

// ── Topology ──────────────────────────────────────────────────────

/// An undirected, delay-weighted link between two switches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub nodes: [SwitchId; 2],
    pub delay: f64,
}

/// The network graph. Static for the duration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Topology {
    pub switches: Vec<SwitchId>,
    #[serde(default)]
    pub links: Vec<Link>,
}

// ── Snapshot ──────────────────────────────────────────────────────

/// Serialized simulation input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub applications: Vec<Application>,
    #[serde(default)]
    pub services: Vec<Service>,
    #[serde(default)]
    pub edge_servers: Vec<EdgeServer>,
    #[serde(default)]
    pub topology: Topology,
}

impl Snapshot {
    /// Parse a snapshot from a JSON string.
    pub fn from_json(json: &str) -> ModelResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a snapshot from a JSON file.
    pub fn from_file(path: &Path) -> ModelResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// SHA-256 of the canonical JSON encoding, hex-encoded.
    ///
    /// Identical inputs produce identical digests, so the digest doubles as
    /// a run identifier.
    pub fn digest(&self) -> ModelResult<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&bytes)))
    }
}

impl EdgeServer {
    /// Power drawn at the given CPU load under the linear model.
    pub fn power_at(&self, cpu_demand: u32) -> f64 {
        let max = self.power_model.max_power_consumption;
        let static_power = self.power_model.static_power_percentage * max;
        let utilization = if self.cpu > 0 {
            f64::from(cpu_demand.min(self.cpu)) / f64::from(self.cpu)
        } else {
            0.0
        };
        static_power + (max - static_power) * utilization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "users": [{"id": 1, "base_switch": 1, "delay_slas": {"1": 10.0}, "providers_trust": {"1": 1.0}}],
        "applications": [{"id": 1, "user": 1, "services": [1]}],
        "services": [{"id": 1, "application": 1, "cpu_demand": 1, "memory_demand": 1}],
        "edge_servers": [{
            "id": 1, "provider": 1, "cpu": 2, "memory": 2, "switch": 1,
            "power_model": {"static_power_percentage": 0.1, "max_power_consumption": 100.0}
        }],
        "topology": {"switches": [1]}
    }"#;

    #[test]
    fn parses_minimal_snapshot() {
        let snapshot = Snapshot::from_json(MINIMAL).unwrap();
        assert_eq!(snapshot.users[0].delay_slas.get(&1), Some(&10.0));
        assert_eq!(snapshot.services[0].privacy_requirement, 0.0);
        assert!(snapshot.services[0].server.is_none());
        assert!(snapshot.topology.links.is_empty());
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(Snapshot::from_json("{\"users\": 3}").is_err());
    }

    #[test]
    fn reads_snapshot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(&path, MINIMAL).unwrap();

        let snapshot = Snapshot::from_file(&path).unwrap();
        assert_eq!(snapshot.edge_servers.len(), 1);
    }

    #[test]
    fn digest_is_stable_and_input_sensitive() {
        let a = Snapshot::from_json(MINIMAL).unwrap();
        let mut b = a.clone();
        assert_eq!(a.digest().unwrap(), b.digest().unwrap());
        assert_eq!(a.digest().unwrap().len(), 64);

        b.services[0].cpu_demand = 2;
        assert_ne!(a.digest().unwrap(), b.digest().unwrap());
    }

    #[test]
    fn linear_power_model() {
        let snapshot = Snapshot::from_json(MINIMAL).unwrap();
        let server = &snapshot.edge_servers[0];
        assert!((server.power_at(0) - 10.0).abs() < 1e-9);
        assert!((server.power_at(1) - 55.0).abs() < 1e-9);
        assert!((server.power_at(2) - 100.0).abs() < 1e-9);
    }
}
