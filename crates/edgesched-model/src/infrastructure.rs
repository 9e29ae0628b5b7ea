//! Infrastructure: validated, indexed view of a snapshot with capacity
//! bookkeeping.
//!
//! The scheduler only reads through the accessors here and mutates through
//! [`Infrastructure::provision`]. Server usage is derived from service
//! assignments at construction and kept in step with every provision.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::error::{ModelError, ModelResult};
use crate::metrics::MigrationRecord;
use crate::types::*;

/// Resources currently consumed on one edge server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerUsage {
    pub cpu: u32,
    pub memory: u32,
}

/// Validated, mutable simulation state.
#[derive(Debug, Clone)]
pub struct Infrastructure {
    users: Vec<User>,
    applications: Vec<Application>,
    services: Vec<Service>,
    edge_servers: Vec<EdgeServer>,
    topology: Topology,
    usage: Vec<ServerUsage>,
    user_index: HashMap<UserId, usize>,
    application_index: HashMap<ApplicationId, usize>,
    service_index: HashMap<ServiceId, usize>,
    server_index: HashMap<ServerId, usize>,
    migrations: HashMap<ServiceId, Vec<MigrationRecord>>,
}

/// Build an id → position index, rejecting duplicates.
fn index_by<T>(
    items: &[T],
    kind: &str,
    id: impl Fn(&T) -> u32,
) -> ModelResult<HashMap<u32, usize>> {
    let mut index = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        if index.insert(id(item), pos).is_some() {
            return Err(invalid(format!("duplicate {kind} id {}", id(item))));
        }
    }
    Ok(index)
}

fn invalid(msg: impl Into<String>) -> ModelError {
    ModelError::InvalidSnapshot(msg.into())
}

impl Infrastructure {
    /// Validate a snapshot and build the indexed infrastructure.
    pub fn new(snapshot: Snapshot) -> ModelResult<Self> {
        let Snapshot {
            users,
            applications,
            services,
            edge_servers,
            topology,
        } = snapshot;

        let user_index = index_by(&users, "user", |u| u.id)?;
        let application_index = index_by(&applications, "application", |a| a.id)?;
        let service_index = index_by(&services, "service", |s| s.id)?;
        let server_index = index_by(&edge_servers, "edge server", |s| s.id)?;

        let mut infra = Self {
            usage: vec![ServerUsage::default(); edge_servers.len()],
            users,
            applications,
            services,
            edge_servers,
            topology,
            user_index,
            application_index,
            service_index,
            server_index,
            migrations: HashMap::new(),
        };
        infra.validate()?;
        infra.charge_initial_hosts()?;

        info!(
            users = infra.users.len(),
            applications = infra.applications.len(),
            services = infra.services.len(),
            edge_servers = infra.edge_servers.len(),
            switches = infra.topology.switches.len(),
            "infrastructure loaded"
        );
        Ok(infra)
    }

    fn validate(&self) -> ModelResult<()> {
        let switches: HashSet<SwitchId> = self.topology.switches.iter().copied().collect();
        if switches.len() != self.topology.switches.len() {
            return Err(invalid("duplicate switch id in topology"));
        }

        for link in &self.topology.links {
            if !link.delay.is_finite() || link.delay < 0.0 {
                return Err(invalid(format!(
                    "link {:?} has invalid delay {}",
                    link.nodes, link.delay
                )));
            }
            if let Some(missing) = link.nodes.iter().find(|s| !switches.contains(s)) {
                return Err(invalid(format!("link references unknown switch {missing}")));
            }
        }

        for server in &self.edge_servers {
            if server.cpu == 0 {
                return Err(invalid(format!("edge server {} has no CPU", server.id)));
            }
            if !switches.contains(&server.switch) {
                return Err(invalid(format!(
                    "edge server {} references unknown switch {}",
                    server.id, server.switch
                )));
            }
        }

        for user in &self.users {
            if !switches.contains(&user.base_switch) {
                return Err(invalid(format!(
                    "user {} references unknown switch {}",
                    user.id, user.base_switch
                )));
            }
            for (provider, trust) in &user.providers_trust {
                if !(0.0..=1.0).contains(trust) {
                    return Err(invalid(format!(
                        "user {} trust in provider {provider} is outside [0, 1]",
                        user.id
                    )));
                }
            }
            for server in &self.edge_servers {
                if !user.providers_trust.contains_key(&server.provider) {
                    return Err(invalid(format!(
                        "user {} has no trust entry for provider {}",
                        user.id, server.provider
                    )));
                }
            }
        }

        let mut listed: HashSet<ServiceId> = HashSet::new();
        for app in &self.applications {
            let user = self.user(app.user).map_err(|_| {
                invalid(format!("application {} references unknown user {}", app.id, app.user))
            })?;
            match user.delay_slas.get(&app.id) {
                Some(sla) if sla.is_finite() && *sla > 0.0 => {}
                Some(sla) => {
                    return Err(invalid(format!(
                        "user {} has invalid delay SLA {sla} for application {}",
                        user.id, app.id
                    )));
                }
                None => {
                    return Err(invalid(format!(
                        "user {} has no delay SLA for application {}",
                        user.id, app.id
                    )));
                }
            }
            if app.services.is_empty() {
                return Err(invalid(format!("application {} has no services", app.id)));
            }
            for service_id in &app.services {
                let service = self.service(*service_id).map_err(|_| {
                    invalid(format!(
                        "application {} lists unknown service {service_id}",
                        app.id
                    ))
                })?;
                if service.application != app.id || !listed.insert(*service_id) {
                    return Err(invalid(format!(
                        "service {service_id} is not owned by application {}",
                        app.id
                    )));
                }
            }
        }

        for service in &self.services {
            if !listed.contains(&service.id) {
                return Err(invalid(format!(
                    "service {} is not part of any application chain",
                    service.id
                )));
            }
            if !(0.0..=1.0).contains(&service.privacy_requirement) {
                return Err(invalid(format!(
                    "service {} privacy requirement is outside [0, 1]",
                    service.id
                )));
            }
        }

        Ok(())
    }

    /// Account for services that arrive already hosted.
    fn charge_initial_hosts(&mut self) -> ModelResult<()> {
        for pos in 0..self.services.len() {
            let Some(server_id) = self.services[pos].server else {
                continue;
            };
            let service_id = self.services[pos].id;
            let server_pos = *self.server_index.get(&server_id).ok_or_else(|| {
                invalid(format!(
                    "service {service_id} is hosted on unknown edge server {server_id}"
                ))
            })?;
            if !self.fits(pos, server_pos) {
                return Err(invalid(format!(
                    "initial placement of service {service_id} exceeds capacity of edge server {server_id}"
                )));
            }
            self.charge(pos, server_pos);
        }
        Ok(())
    }

    // ── Read accessors ────────────────────────────────────────────

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn applications(&self) -> &[Application] {
        &self.applications
    }

    pub fn services(&self) -> &[Service] {
        &self.services
    }

    pub fn edge_servers(&self) -> &[EdgeServer] {
        &self.edge_servers
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn user(&self, id: UserId) -> ModelResult<&User> {
        self.user_index
            .get(&id)
            .map(|&pos| &self.users[pos])
            .ok_or(ModelError::UnknownEntity { kind: "user", id })
    }

    pub fn application(&self, id: ApplicationId) -> ModelResult<&Application> {
        self.application_index
            .get(&id)
            .map(|&pos| &self.applications[pos])
            .ok_or(ModelError::UnknownEntity { kind: "application", id })
    }

    pub fn service(&self, id: ServiceId) -> ModelResult<&Service> {
        self.service_index
            .get(&id)
            .map(|&pos| &self.services[pos])
            .ok_or(ModelError::UnknownEntity { kind: "service", id })
    }

    pub fn edge_server(&self, id: ServerId) -> ModelResult<&EdgeServer> {
        self.server_index
            .get(&id)
            .map(|&pos| &self.edge_servers[pos])
            .ok_or(ModelError::UnknownEntity { kind: "edge server", id })
    }

    /// The single user owning an application.
    pub fn owner(&self, app: &Application) -> ModelResult<&User> {
        self.user(app.user)
    }

    /// Delay SLA the owning user set for an application.
    pub fn delay_sla(&self, app: &Application) -> ModelResult<f64> {
        let user = self.owner(app)?;
        user.delay_slas.get(&app.id).copied().ok_or_else(|| {
            invalid(format!(
                "user {} has no delay SLA for application {}",
                user.id, app.id
            ))
        })
    }

    /// Trust a user places in a provider.
    pub fn trust(&self, user: &User, provider: ProviderId) -> ModelResult<f64> {
        user.providers_trust.get(&provider).copied().ok_or_else(|| {
            invalid(format!(
                "user {} has no trust entry for provider {provider}",
                user.id
            ))
        })
    }

    /// Resources currently consumed on a server.
    pub fn usage(&self, server: ServerId) -> ModelResult<ServerUsage> {
        let pos = self.server_pos(server)?;
        Ok(self.usage[pos])
    }

    pub fn free_cpu(&self, server: ServerId) -> ModelResult<u32> {
        let pos = self.server_pos(server)?;
        Ok(self.edge_servers[pos].cpu.saturating_sub(self.usage[pos].cpu))
    }

    pub fn free_memory(&self, server: ServerId) -> ModelResult<u32> {
        let pos = self.server_pos(server)?;
        Ok(self.edge_servers[pos].memory.saturating_sub(self.usage[pos].memory))
    }

    /// A server with no CPU in use draws only static power.
    pub fn is_idle(&self, server: ServerId) -> ModelResult<bool> {
        Ok(self.usage(server)?.cpu == 0)
    }

    /// Whether the server's free resources cover the service's demand.
    pub fn has_capacity_to_host(&self, server: ServerId, service: ServiceId) -> ModelResult<bool> {
        let server_pos = self.server_pos(server)?;
        let service_pos = self.service_pos(service)?;
        Ok(self.fits(service_pos, server_pos))
    }

    /// Services not hosted anywhere, in discovery order.
    pub fn pending_services(&self) -> impl Iterator<Item = &Service> {
        self.services.iter().filter(|s| s.server.is_none())
    }

    pub fn has_pending_services(&self) -> bool {
        self.pending_services().next().is_some()
    }

    /// Migration history of a service, oldest first.
    pub fn migrations(&self, service: ServiceId) -> &[MigrationRecord] {
        self.migrations
            .get(&service)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Current state rendered back into snapshot form.
    pub fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.clone(),
            applications: self.applications.clone(),
            services: self.services.clone(),
            edge_servers: self.edge_servers.clone(),
            topology: self.topology.clone(),
        }
    }

    // ── Mutation ──────────────────────────────────────────────────

    /// Move a service onto `target`.
    ///
    /// Releases the previous host's resources, consumes the target's, and
    /// records the migration. Nothing changes if the target lacks capacity.
    pub fn provision(&mut self, service: ServiceId, target: ServerId, step: u64) -> ModelResult<()> {
        let service_pos = self.service_pos(service)?;
        let target_pos = self.server_pos(target)?;
        let origin = self.services[service_pos].server;

        if origin == Some(target) {
            return Ok(());
        }
        if !self.fits(service_pos, target_pos) {
            return Err(ModelError::InsufficientCapacity {
                service,
                server: target,
            });
        }

        if let Some(origin_id) = origin {
            let origin_pos = self.server_pos(origin_id)?;
            self.release(service_pos, origin_pos);
        }
        self.charge(service_pos, target_pos);
        self.services[service_pos].server = Some(target);
        self.migrations
            .entry(service)
            .or_default()
            .push(MigrationRecord { origin, target, step });

        debug!(service, ?origin, target, step, "service provisioned");
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────

    fn server_pos(&self, id: ServerId) -> ModelResult<usize> {
        self.server_index
            .get(&id)
            .copied()
            .ok_or(ModelError::UnknownEntity { kind: "edge server", id })
    }

    fn service_pos(&self, id: ServiceId) -> ModelResult<usize> {
        self.service_index
            .get(&id)
            .copied()
            .ok_or(ModelError::UnknownEntity { kind: "service", id })
    }

    fn fits(&self, service_pos: usize, server_pos: usize) -> bool {
        let service = &self.services[service_pos];
        let server = &self.edge_servers[server_pos];
        let used = self.usage[server_pos];
        server.cpu.saturating_sub(used.cpu) >= service.cpu_demand
            && server.memory.saturating_sub(used.memory) >= service.memory_demand
    }

    fn charge(&mut self, service_pos: usize, server_pos: usize) {
        let service = &self.services[service_pos];
        let used = &mut self.usage[server_pos];
        used.cpu += service.cpu_demand;
        used.memory += service.memory_demand;
    }

    fn release(&mut self, service_pos: usize, server_pos: usize) {
        let service = &self.services[service_pos];
        let used = &mut self.usage[server_pos];
        used.cpu = used.cpu.saturating_sub(service.cpu_demand);
        used.memory = used.memory.saturating_sub(service.memory_demand);
    }
}
