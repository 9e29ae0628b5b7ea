//! THEA: trust-, delay- and power-aware heuristic placement.
//!
//! Each tick runs through three phases:
//!
//! 1. **Scoring**: delay and privacy pressure for every application that
//!    still has an unhosted service
//! 2. **Ranking**: applications ordered by combined normalized pressure
//! 3. **Committing**: for each application in that order, each service in
//!    chain order is scored against every edge server, ranked, and
//!    committed to the first candidate with capacity
//!
//! Candidate scoring happens inside the commit loop because every commit
//! shifts the chain predecessor and the capacity the next service sees.
//! Nothing survives between ticks except the path cache.

use edgesched_model::{Application, Infrastructure};
use edgesched_placement::{
    CommitOutcome, PathOracle, application_metrics, commit, host_candidates, rank_applications,
    rank_candidates,
};
use tracing::{debug, info};

use crate::error::SchedulerResult;
use crate::strategy::{Commit, PlacementStrategy, TickSummary};

/// Where the driver is within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    Scoring,
    Ranking,
    Committing,
}

/// The THEA scheduler driver.
#[derive(Debug)]
pub struct TheaStrategy {
    oracle: Option<PathOracle>,
    phase: DriverPhase,
}

impl TheaStrategy {
    pub const NAME: &'static str = "thea";

    pub fn new() -> Self {
        Self {
            oracle: None,
            phase: DriverPhase::Idle,
        }
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// The run's path oracle, once the first tick or `begin_run` built it.
    pub fn oracle(&self) -> Option<&PathOracle> {
        self.oracle.as_ref()
    }
}

impl Default for TheaStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacementStrategy for TheaStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn begin_run(&mut self, infra: &Infrastructure) {
        self.oracle = Some(PathOracle::new(infra.topology()));
        self.phase = DriverPhase::Idle;
        debug!("path cache reset for new run");
    }

    fn on_tick(&mut self, infra: &mut Infrastructure, step: u64) -> SchedulerResult<TickSummary> {
        info!(step, "thea tick");
        let oracle = self
            .oracle
            .get_or_insert_with(|| PathOracle::new(infra.topology()));
        let result = schedule_tick(infra, oracle, &mut self.phase, step);
        enter(&mut self.phase, DriverPhase::Idle, step);
        result
    }
}

fn enter(phase: &mut DriverPhase, next: DriverPhase, step: u64) {
    let from = *phase;
    if from != next {
        debug!(step, ?from, to = ?next, "driver phase");
        *phase = next;
    }
}

fn has_unhosted_service(infra: &Infrastructure, app: &Application) -> SchedulerResult<bool> {
    for &id in &app.services {
        if infra.service(id)?.server.is_none() {
            return Ok(true);
        }
    }
    Ok(false)
}

fn schedule_tick(
    infra: &mut Infrastructure,
    oracle: &mut PathOracle,
    phase: &mut DriverPhase,
    step: u64,
) -> SchedulerResult<TickSummary> {
    let mut summary = TickSummary {
        step,
        ..TickSummary::default()
    };

    enter(phase, DriverPhase::Scoring, step);
    let mut batch = Vec::new();
    for app in infra.applications() {
        if has_unhosted_service(infra, app)? {
            batch.push(application_metrics(infra, oracle, app)?);
        }
    }
    if batch.is_empty() {
        debug!(step, "no application awaiting placement");
        return Ok(summary);
    }

    enter(phase, DriverPhase::Ranking, step);
    let applications = rank_applications(batch);

    enter(phase, DriverPhase::Committing, step);
    for ranked_app in &applications {
        let chain = infra.application(ranked_app.metrics.application)?.services.clone();
        for service in chain {
            let candidates = host_candidates(infra, oracle, infra.service(service)?)?;
            let ranked = rank_candidates(candidates);
            if let Some(best) = ranked.first() {
                debug!(
                    step,
                    service,
                    best = best.metrics.server,
                    sla_violations = best.metrics.sla_violations,
                    tie_break = best.tie_break,
                    "candidates ranked"
                );
            }

            match commit(infra, service, &ranked, step)? {
                CommitOutcome::Committed { server, origin } => summary.commits.push(Commit {
                    service,
                    server,
                    origin,
                }),
                CommitOutcome::Retained { .. } => {}
                CommitOutcome::NoFeasibleHost => summary.unplaced.push(service),
            }
        }
    }

    info!(
        step,
        applications = applications.len(),
        commits = summary.commits.len(),
        unplaced = summary.unplaced.len(),
        "thea tick finished"
    );
    Ok(summary)
}
