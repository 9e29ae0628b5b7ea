//! Per-step metrics collected by the host, keyed by entity kind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelResult;
use crate::infrastructure::Infrastructure;
use crate::types::{ApplicationId, ServerId};

/// One completed move of a service onto a server.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MigrationRecord {
    /// Previous host, `None` for the initial placement.
    pub origin: Option<ServerId>,
    pub target: ServerId,
    pub step: u64,
}

/// State of one service at the end of a step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceState {
    pub time_step: u64,
    pub instance_id: u32,
    pub available: bool,
    pub server: Option<ServerId>,
    /// Always `false`: `Infrastructure::provision` completes within the tick,
    /// so no service is observed mid-migration.
    pub being_provisioned: bool,
    pub last_migration: Option<MigrationRecord>,
}

/// End-to-end delay of each application of one user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserState {
    pub time_step: u64,
    pub instance_id: u32,
    /// `None` while the chain is incomplete or unreachable.
    pub delays: BTreeMap<ApplicationId, Option<f64>>,
}

/// Load and power draw of one edge server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EdgeServerState {
    pub time_step: u64,
    pub instance_id: u32,
    pub cpu_demand: u32,
    pub memory_demand: u32,
    pub power_consumption: f64,
}

/// Metrics for a whole run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationMetrics {
    #[serde(rename = "Service")]
    pub services: Vec<ServiceState>,
    #[serde(rename = "User")]
    pub users: Vec<UserState>,
    #[serde(rename = "EdgeServer")]
    pub edge_servers: Vec<EdgeServerState>,
}

impl SimulationMetrics {
    /// Append the state of every entity at the end of `step`.
    ///
    /// Chain delays come from the caller since path computation lives with
    /// the scheduler.
    pub fn record_step(
        &mut self,
        infra: &Infrastructure,
        step: u64,
        chain_delays: &BTreeMap<ApplicationId, Option<f64>>,
    ) -> ModelResult<()> {
        for service in infra.services() {
            self.services.push(ServiceState {
                time_step: step,
                instance_id: service.id,
                available: service.server.is_some(),
                server: service.server,
                being_provisioned: false,
                last_migration: infra.migrations(service.id).last().copied(),
            });
        }

        for user in infra.users() {
            let delays = infra
                .applications()
                .iter()
                .filter(|app| app.user == user.id)
                .map(|app| (app.id, chain_delays.get(&app.id).copied().flatten()))
                .collect();
            self.users.push(UserState {
                time_step: step,
                instance_id: user.id,
                delays,
            });
        }

        for server in infra.edge_servers() {
            let usage = infra.usage(server.id)?;
            self.edge_servers.push(EdgeServerState {
                time_step: step,
                instance_id: server.id,
                cpu_demand: usage.cpu,
                memory_demand: usage.memory,
                power_consumption: server.power_at(usage.cpu),
            });
        }

        Ok(())
    }

    /// Latest recorded state of each service.
    pub fn final_services(&self) -> Vec<&ServiceState> {
        let Some(last) = self.services.last().map(|s| s.time_step) else {
            return Vec::new();
        };
        self.services.iter().filter(|s| s.time_step == last).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Snapshot;

    const SNAPSHOT: &str = r#"{
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
    fn records_every_entity_kind() {
        let mut infra = Infrastructure::new(Snapshot::from_json(SNAPSHOT).unwrap()).unwrap();
        let mut metrics = SimulationMetrics::default();

        metrics.record_step(&infra, 1, &BTreeMap::from([(1, None)])).unwrap();
        infra.provision(1, 1, 2).unwrap();
        metrics
            .record_step(&infra, 2, &BTreeMap::from([(1, Some(0.0))]))
            .unwrap();

        assert_eq!(metrics.services.len(), 2);
        assert!(!metrics.services[0].available);
        assert_eq!(metrics.services[1].server, Some(1));
        assert_eq!(metrics.services[1].last_migration.unwrap().step, 2);
        assert!(!metrics.services[1].being_provisioned);
        assert_eq!(metrics.users[1].delays.get(&1), Some(&Some(0.0)));
        assert!((metrics.edge_servers[1].power_consumption - 55.0).abs() < 1e-9);

        let last = metrics.final_services();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].time_step, 2);
    }

    #[test]
    fn serializes_keyed_by_entity_kind() {
        let value = serde_json::to_value(SimulationMetrics::default()).unwrap();
        let obj = value.as_object().unwrap();
        assert!(obj.contains_key("Service"));
        assert!(obj.contains_key("User"));
        assert!(obj.contains_key("EdgeServer"));
    }
}
