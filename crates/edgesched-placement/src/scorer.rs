//! Metric scoring for placement decisions.
//!
//! Two record types feed the ranking engine:
//! - **[`ApplicationMetrics`]**: how constrained an application is (delay
//!   pressure from few nearby servers and a tight SLA, privacy pressure from
//!   large footprints with strict trust needs)
//! - **[`CandidateMetrics`]**: how good one edge server is for one service
//!   (SLA violations, end-to-end delay cost, marginal power, collateral
//!   impact on other pending services)
//!
//! Chain accounting walks user → service₁ → … → serviceₙ over the current
//! hosts, so every commit changes what the next service sees.

use edgesched_model::{Application, EdgeServer, Infrastructure, Service, ServiceId, SwitchId};

use crate::error::PlacementResult;
use crate::normalize::MetricFields;
use crate::paths::{PathDelay, PathOracle};

// ── Application metrics ───────────────────────────────────────────

/// Scores used to decide which application is scheduled first.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationMetrics {
    pub application: edgesched_model::ApplicationId,
    pub number_of_services: usize,
    pub delay_sla: f64,
    pub delay_score: f64,
    pub privacy_score: f64,
}

/// Normalized fields of [`ApplicationMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationField {
    DelayScore,
    PrivacyScore,
}

impl MetricFields for ApplicationMetrics {
    type Field = ApplicationField;
    const FIELDS: &'static [ApplicationField] =
        &[ApplicationField::DelayScore, ApplicationField::PrivacyScore];

    fn field(&self, field: ApplicationField) -> Option<f64> {
        match field {
            ApplicationField::DelayScore => Some(self.delay_score),
            ApplicationField::PrivacyScore => Some(self.privacy_score),
        }
    }
}

/// Delay pressure: `(1 / sqrt(n · SLA)) · services`, where `n` counts the
/// servers reachable from the user within the SLA. Zero when `n = 0`.
pub fn delay_score(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    app: &Application,
) -> PlacementResult<f64> {
    let sla = infra.delay_sla(app)?;
    let user_switch = infra.owner(app)?.base_switch;

    let mut within_sla = 0usize;
    for server in infra.edge_servers() {
        if oracle.delay(user_switch, server.switch)?.within(sla) {
            within_sla += 1;
        }
    }

    if within_sla == 0 {
        return Ok(0.0);
    }
    Ok((1.0 / (within_sla as f64 * sla).sqrt()) * app.services.len() as f64)
}

/// Privacy pressure: `Σ sqrt(cpu · memory) · (1 + privacy requirement)`.
pub fn privacy_score(infra: &Infrastructure, app: &Application) -> PlacementResult<f64> {
    let mut score = 0.0;
    for &id in &app.services {
        let service = infra.service(id)?;
        let footprint = (f64::from(service.cpu_demand) * f64::from(service.memory_demand)).sqrt();
        score += footprint * (1.0 + service.privacy_requirement);
    }
    Ok(score)
}

pub fn application_metrics(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    app: &Application,
) -> PlacementResult<ApplicationMetrics> {
    Ok(ApplicationMetrics {
        application: app.id,
        number_of_services: app.services.len(),
        delay_sla: infra.delay_sla(app)?,
        delay_score: delay_score(infra, oracle, app)?,
        privacy_score: privacy_score(infra, app)?,
    })
}

// ── Chain accounting ──────────────────────────────────────────────

/// Where a service's predecessor sits and the delay accrued to reach it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainPosition {
    pub predecessor_switch: SwitchId,
    pub accrued_delay: PathDelay,
    pub is_last: bool,
}

/// Locate a service in its application chain.
///
/// The predecessor is the nearest earlier service that currently has a
/// host, or the user when there is none. Unhosted services in between add
/// no delay.
pub fn chain_position(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    service: &Service,
) -> PlacementResult<ChainPosition> {
    let app = infra.application(service.application)?;
    let mut switch = infra.owner(app)?.base_switch;
    let mut accrued = PathDelay::Finite(0.0);

    for &id in app.services.iter().take_while(|&&id| id != service.id) {
        let Some(host) = infra.service(id)?.server else {
            continue;
        };
        let host_switch = infra.edge_server(host)?.switch;
        accrued = accrued.plus(oracle.delay(switch, host_switch)?);
        switch = host_switch;
    }

    Ok(ChainPosition {
        predecessor_switch: switch,
        accrued_delay: accrued,
        is_last: app.services.last() == Some(&service.id),
    })
}

/// End-to-end delay user → s₁ → … → sₙ over current hosts.
///
/// `None` while any service is unhosted or a hop is unreachable.
pub fn chain_delay(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    app: &Application,
) -> PlacementResult<Option<f64>> {
    let mut switch = infra.owner(app)?.base_switch;
    let mut total = PathDelay::Finite(0.0);
    for &id in &app.services {
        let Some(host) = infra.service(id)?.server else {
            return Ok(None);
        };
        let host_switch = infra.edge_server(host)?.switch;
        total = total.plus(oracle.delay(switch, host_switch)?);
        switch = host_switch;
    }
    Ok(total.finite())
}

// ── Candidate metrics ─────────────────────────────────────────────

/// Metrics for hosting one service on one edge server.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMetrics {
    pub server: edgesched_model::ServerId,
    /// 0, 1 or 2: delay SLA and privacy/trust violations.
    pub sla_violations: u8,
    /// Extra delay at the chain's tail; zero for non-last services.
    pub delay_cost: PathDelay,
    pub power_consumption: f64,
    /// Collateral impact on other pending services; zero for non-last services.
    pub affected_services_cost: f64,
}

/// Normalized fields of [`CandidateMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateField {
    AffectedServicesCost,
    PowerConsumption,
    DelayCost,
}

impl MetricFields for CandidateMetrics {
    type Field = CandidateField;
    const FIELDS: &'static [CandidateField] = &[
        CandidateField::AffectedServicesCost,
        CandidateField::PowerConsumption,
        CandidateField::DelayCost,
    ];

    fn field(&self, field: CandidateField) -> Option<f64> {
        match field {
            CandidateField::AffectedServicesCost => Some(self.affected_services_cost),
            CandidateField::PowerConsumption => Some(self.power_consumption),
            CandidateField::DelayCost => self.delay_cost.finite(),
        }
    }
}

/// Score every edge server as a host for `service`, in discovery order.
///
/// Capacity is deliberately ignored here; the placer checks it at commit.
pub fn host_candidates(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    service: &Service,
) -> PlacementResult<Vec<CandidateMetrics>> {
    let app = infra.application(service.application)?;
    let user = infra.owner(app)?;
    let sla = infra.delay_sla(app)?;
    let position = chain_position(infra, oracle, service)?;

    let mut candidates = Vec::with_capacity(infra.edge_servers().len());
    for server in infra.edge_servers() {
        let additional = oracle.delay(position.predecessor_switch, server.switch)?;
        let overall = position.accrued_delay.plus(additional);

        let violates_delay = !overall.within(sla);
        let violates_privacy = infra.trust(user, server.provider)? < service.privacy_requirement;

        let (delay_cost, affected_services_cost) = if position.is_last {
            (additional, affected_services_cost(infra, oracle, service.id, server)?)
        } else {
            (PathDelay::Finite(0.0), 0.0)
        };

        candidates.push(CandidateMetrics {
            server: server.id,
            sla_violations: u8::from(violates_delay) + u8::from(violates_privacy),
            delay_cost,
            power_consumption: power_consumption(infra, server)?,
            affected_services_cost,
        });
    }
    Ok(candidates)
}

/// Marginal power: per-core draw plus static draw if the server would wake up.
fn power_consumption(infra: &Infrastructure, server: &EdgeServer) -> PlacementResult<f64> {
    let per_core = server.power_model.max_power_consumption / f64::from(server.cpu);
    let wake_up = if infra.is_idle(server.id)? {
        server.power_model.static_power_percentage
    } else {
        0.0
    };
    Ok(per_core + wake_up)
}

/// `Σ 1 / max(1, delay(user, server))` over other unhosted services whose
/// owner trusts the server's provider enough. Unreachable users add nothing.
fn affected_services_cost(
    infra: &Infrastructure,
    oracle: &mut PathOracle,
    current: ServiceId,
    server: &EdgeServer,
) -> PlacementResult<f64> {
    let mut cost = 0.0;
    for other in infra.pending_services() {
        if other.id == current {
            continue;
        }
        let owner = infra.owner(infra.application(other.application)?)?;
        if infra.trust(owner, server.provider)? < other.privacy_requirement {
            continue;
        }
        if let PathDelay::Finite(distance) = oracle.delay(owner.base_switch, server.switch)? {
            cost += 1.0 / distance.max(1.0);
        }
    }
    Ok(cost)
}
