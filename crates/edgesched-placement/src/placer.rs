//! Placement committer: turns a ranked candidate list into a host.
//!
//! Walks candidates best first and provisions the service on the first one
//! with enough free capacity. The service's current host is never a commit
//! target; a hosted service stays put only when no other candidate fits.

use edgesched_model::{Infrastructure, ServerId, ServiceId};
use tracing::{debug, info, warn};

use crate::error::PlacementResult;
use crate::ranking::RankedCandidate;

/// What happened to one service during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Provisioned onto `server`, moving off `origin` if it had a host.
    Committed {
        server: ServerId,
        origin: Option<ServerId>,
    },
    /// Kept on its current host because no other candidate had capacity.
    Retained { server: ServerId },
    /// No ranked candidate had capacity; retried next tick.
    NoFeasibleHost,
}

/// Commit `service` to the first feasible candidate in `ranked`.
pub fn commit(
    infra: &mut Infrastructure,
    service: ServiceId,
    ranked: &[RankedCandidate],
    step: u64,
) -> PlacementResult<CommitOutcome> {
    let current = infra.service(service)?.server;

    for candidate in ranked {
        let server = candidate.metrics.server;
        if current == Some(server) {
            debug!(service, server, "skipping current host");
            continue;
        }
        if !infra.has_capacity_to_host(server, service)? {
            continue;
        }

        infra.provision(service, server, step)?;
        info!(
            service,
            server,
            origin = ?current,
            sla_violations = candidate.metrics.sla_violations,
            tie_break = candidate.tie_break,
            step,
            "service committed"
        );
        return Ok(CommitOutcome::Committed {
            server,
            origin: current,
        });
    }

    Ok(match current {
        Some(server) => CommitOutcome::Retained { server },
        None => {
            warn!(service, step, candidates = ranked.len(), "no feasible host this tick");
            CommitOutcome::NoFeasibleHost
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use edgesched_model::*;

    use super::*;
    use crate::paths::PathDelay;
    use crate::scorer::CandidateMetrics;

    fn server(id: ServerId, cpu: u32) -> EdgeServer {
        EdgeServer {
            id,
            provider: 1,
            cpu,
            memory: cpu,
            switch: 1,
            power_model: PowerModel {
                static_power_percentage: 0.1,
                max_power_consumption: 50.0,
            },
        }
    }

    fn infra(servers: Vec<EdgeServer>, demand: u32) -> Infrastructure {
        Infrastructure::new(Snapshot {
            users: vec![User {
                id: 1,
                base_switch: 1,
                delay_slas: BTreeMap::from([(1, 10.0)]),
                providers_trust: BTreeMap::from([(1, 1.0)]),
            }],
            applications: vec![Application {
                id: 1,
                user: 1,
                services: vec![1],
            }],
            services: vec![Service {
                id: 1,
                application: 1,
                cpu_demand: demand,
                memory_demand: demand,
                privacy_requirement: 0.0,
                server: None,
            }],
            edge_servers: servers,
            topology: Topology {
                switches: vec![1],
                links: vec![],
            },
        })
        .unwrap()
    }

    fn ranked(servers: &[ServerId]) -> Vec<RankedCandidate> {
        servers
            .iter()
            .map(|&server| RankedCandidate {
                metrics: CandidateMetrics {
                    server,
                    sla_violations: 0,
                    delay_cost: PathDelay::Finite(0.0),
                    power_consumption: 1.0,
                    affected_services_cost: 0.0,
                },
                tie_break: 0.0,
            })
            .collect()
    }

    #[test]
    fn commits_to_best_candidate_with_capacity() {
        let mut infra = infra(vec![server(1, 1), server(2, 4), server(3, 4)], 2);

        let outcome = commit(&mut infra, 1, &ranked(&[1, 3, 2]), 1).unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                server: 3,
                origin: None
            }
        );
        assert_eq!(infra.free_cpu(3).unwrap(), 2);
        assert_eq!(infra.free_cpu(2).unwrap(), 4);
    }

    #[test]
    fn no_capacity_leaves_service_pending() {
        let mut infra = infra(vec![server(1, 1), server(2, 1)], 2);

        let outcome = commit(&mut infra, 1, &ranked(&[1, 2]), 1).unwrap();

        assert_eq!(outcome, CommitOutcome::NoFeasibleHost);
        assert!(infra.service(1).unwrap().server.is_none());
        assert_eq!(infra.pending_services().count(), 1);
    }

    #[test]
    fn current_host_is_skipped_for_next_feasible_candidate() {
        let mut infra = infra(vec![server(1, 4), server(2, 4)], 2);
        infra.provision(1, 1, 1).unwrap();

        let outcome = commit(&mut infra, 1, &ranked(&[1, 2]), 2).unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                server: 2,
                origin: Some(1)
            }
        );
        assert_eq!(infra.service(1).unwrap().server, Some(2));
        assert_eq!(infra.free_cpu(1).unwrap(), 4);
        assert_eq!(infra.migrations(1).len(), 2);
    }

    #[test]
    fn current_host_as_only_candidate_is_retained() {
        let mut infra = infra(vec![server(1, 4), server(2, 4)], 2);
        infra.provision(1, 1, 1).unwrap();

        let outcome = commit(&mut infra, 1, &ranked(&[1]), 2).unwrap();

        assert_eq!(outcome, CommitOutcome::Retained { server: 1 });
        assert_eq!(infra.migrations(1).len(), 1);
    }

    #[test]
    fn better_feasible_candidate_triggers_migration() {
        let mut infra = infra(vec![server(1, 4), server(2, 4)], 2);
        infra.provision(1, 1, 1).unwrap();

        let outcome = commit(&mut infra, 1, &ranked(&[2, 1]), 2).unwrap();

        assert_eq!(
            outcome,
            CommitOutcome::Committed {
                server: 2,
                origin: Some(1)
            }
        );
        assert_eq!(infra.free_cpu(1).unwrap(), 4);
        assert_eq!(infra.free_cpu(2).unwrap(), 2);
    }

    #[test]
    fn hosted_service_without_alternatives_is_retained() {
        let mut infra = infra(vec![server(1, 2), server(2, 1)], 2);
        infra.provision(1, 1, 1).unwrap();

        let outcome = commit(&mut infra, 1, &ranked(&[2]), 2).unwrap();
        assert_eq!(outcome, CommitOutcome::Retained { server: 1 });
    }

    #[test]
    fn empty_candidate_list_is_no_feasible_host() {
        let mut infra = infra(vec![server(1, 4)], 1);
        assert_eq!(
            commit(&mut infra, 1, &[], 1).unwrap(),
            CommitOutcome::NoFeasibleHost
        );
    }
}
