//! Multi-agent placement (`smms`): one decision agent per service.
//!
//! Agents are built lazily on the first tick of a run, one per service in
//! discovery order, and each is stepped once per tick. The decision policy
//! lives entirely in the [`ServiceAgent`] implementation supplied by an
//! [`AgentFactory`]. The built-in [`PassiveAgent`] only observes.

use edgesched_model::{Infrastructure, Service, ServiceId};
use tracing::{info, trace};

use crate::error::SchedulerResult;
use crate::strategy::{Commit, PlacementStrategy, TickSummary};

/// A per-service decision agent.
pub trait ServiceAgent: Send {
    fn service(&self) -> ServiceId;

    /// Take this tick's decision. Returned commits must already have been
    /// applied through `Infrastructure::provision`.
    fn step(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<Vec<Commit>>;
}

/// Builds the agent for one service.
pub trait AgentFactory: Send + Sync {
    fn build(&self, service: &Service) -> Box<dyn ServiceAgent>;
}

impl<F> AgentFactory for F
where
    F: Fn(&Service) -> Box<dyn ServiceAgent> + Send + Sync,
{
    fn build(&self, service: &Service) -> Box<dyn ServiceAgent> {
        self(service)
    }
}

/// Agent that reports its service's state and never moves it.
#[derive(Debug, Clone)]
pub struct PassiveAgent {
    service: ServiceId,
}

impl PassiveAgent {
    pub fn new(service: ServiceId) -> Self {
        Self { service }
    }
}

impl ServiceAgent for PassiveAgent {
    fn service(&self) -> ServiceId {
        self.service
    }

    fn step(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<Vec<Commit>> {
        let server = infra.service(self.service)?.server;
        trace!(step, service = self.service, ?server, "passive agent observed");
        Ok(Vec::new())
    }
}

/// Strategy that steps one agent per service each tick.
pub struct MultiAgentStrategy {
    factory: Box<dyn AgentFactory>,
    agents: Option<Vec<Box<dyn ServiceAgent>>>,
}

impl MultiAgentStrategy {
    pub const NAME: &'static str = "smms";

    pub fn new(factory: impl AgentFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            agents: None,
        }
    }

    /// Strategy backed by [`PassiveAgent`]s.
    pub fn passive() -> Self {
        Self::new(|service: &Service| -> Box<dyn ServiceAgent> {
            Box::new(PassiveAgent::new(service.id))
        })
    }

    /// Number of agents set up for the current run.
    pub fn agent_count(&self) -> usize {
        self.agents.as_ref().map_or(0, Vec::len)
    }
}

impl PlacementStrategy for MultiAgentStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn begin_run(&mut self, _infra: &Infrastructure) {
        self.agents = None;
    }

    fn on_tick(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<TickSummary> {
        let factory = &self.factory;
        let agents = self.agents.get_or_insert_with(|| {
            let agents: Vec<Box<dyn ServiceAgent>> =
                infra.services().iter().map(|s| factory.build(s)).collect();
            info!(agents = agents.len(), "service agents set up");
            agents
        });

        info!(step, "smms tick");
        let mut commits = Vec::new();
        for agent in agents.iter_mut() {
            commits.extend(agent.step(infra, step)?);
        }

        let unplaced = infra.pending_services().map(|s| s.id).collect();
        Ok(TickSummary {
            step,
            commits,
            unplaced,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use edgesched_model::*;

    use super::*;

    fn infra() -> Infrastructure {
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
                services: vec![1, 2],
            }],
            services: (1..=2)
                .map(|id| Service {
                    id,
                    application: 1,
                    cpu_demand: 1,
                    memory_demand: 1,
                    privacy_requirement: 0.0,
                    server: None,
                })
                .collect(),
            edge_servers: vec![EdgeServer {
                id: 1,
                provider: 1,
                cpu: 4,
                memory: 4,
                switch: 1,
                power_model: PowerModel {
                    static_power_percentage: 0.1,
                    max_power_consumption: 100.0,
                },
            }],
            topology: Topology {
                switches: vec![1],
                links: vec![],
            },
        })
        .unwrap()
    }

    /// Places its service on server 1 the first time it is stepped.
    struct EagerAgent {
        service: ServiceId,
        steps: Arc<AtomicUsize>,
    }

    impl ServiceAgent for EagerAgent {
        fn service(&self) -> ServiceId {
            self.service
        }

        fn step(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<Vec<Commit>> {
            self.steps.fetch_add(1, Ordering::Relaxed);
            if infra.service(self.service)?.server.is_some() {
                return Ok(Vec::new());
            }
            infra.provision(self.service, 1, step)?;
            Ok(vec![Commit {
                service: self.service,
                server: 1,
                origin: None,
            }])
        }
    }

    #[test]
    fn passive_agents_place_nothing() {
        let mut infra = infra();
        let mut smms = MultiAgentStrategy::passive();
        smms.begin_run(&infra);

        let summary = smms.on_tick(&mut infra, 1).unwrap();

        assert_eq!(smms.agent_count(), 2);
        assert!(summary.commits.is_empty());
        assert_eq!(summary.unplaced, vec![1, 2]);
    }

    #[test]
    fn agents_are_built_once_and_stepped_every_tick() {
        let steps = Arc::new(AtomicUsize::new(0));
        let counter = steps.clone();
        let mut smms = MultiAgentStrategy::new(move |service: &Service| -> Box<dyn ServiceAgent> {
            Box::new(EagerAgent {
                service: service.id,
                steps: counter.clone(),
            })
        });
        let mut infra = infra();
        smms.begin_run(&infra);

        let first = smms.on_tick(&mut infra, 1).unwrap();
        let second = smms.on_tick(&mut infra, 2).unwrap();

        assert_eq!(first.commits.len(), 2);
        assert!(second.commits.is_empty());
        assert_eq!(steps.load(Ordering::Relaxed), 4);
        assert!(!infra.has_pending_services());
    }

    #[test]
    fn begin_run_discards_agents() {
        let mut infra = infra();
        let mut smms = MultiAgentStrategy::passive();
        smms.on_tick(&mut infra, 1).unwrap();
        assert_eq!(smms.agent_count(), 2);

        smms.begin_run(&infra);
        assert_eq!(smms.agent_count(), 0);
    }
}
