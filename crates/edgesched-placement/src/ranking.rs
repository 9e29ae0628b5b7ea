//! Ranking engine: orders applications and host candidates.
//!
//! Both orderings use stable sorts, so records with equal keys keep their
//! discovery order and a fixed snapshot always ranks the same way.

use tracing::debug;

use crate::normalize::{BatchBounds, MetricFields};
use crate::scorer::{ApplicationMetrics, CandidateField, CandidateMetrics};

/// An application with its combined normalized priority.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedApplication {
    pub metrics: ApplicationMetrics,
    /// `norm(delay_score) + norm(privacy_score)`; higher goes first.
    pub priority: f64,
}

/// A host candidate with its composite tie-break cost.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedCandidate {
    pub metrics: CandidateMetrics,
    /// `norm(affected) + norm(power) + norm(delay_cost)`; lower goes first.
    pub tie_break: f64,
}

/// Order applications by combined priority, most constrained first.
pub fn rank_applications(batch: Vec<ApplicationMetrics>) -> Vec<RankedApplication> {
    let bounds = BatchBounds::compute(&batch);

    let mut ranked: Vec<RankedApplication> = batch
        .into_iter()
        .map(|metrics| {
            let priority = bounds.normalized_sum(&metrics, ApplicationMetrics::FIELDS);
            RankedApplication { metrics, priority }
        })
        .collect();

    ranked.sort_by(|a, b| b.priority.total_cmp(&a.priority));

    for (rank, app) in ranked.iter().enumerate() {
        debug!(
            rank,
            application = app.metrics.application,
            priority = app.priority,
            delay_score = app.metrics.delay_score,
            privacy_score = app.metrics.privacy_score,
            "application ranked"
        );
    }
    ranked
}

/// Order host candidates for one service: fewest SLA violations first, then
/// lowest composite cost.
pub fn rank_candidates(batch: Vec<CandidateMetrics>) -> Vec<RankedCandidate> {
    let bounds = BatchBounds::<CandidateField>::compute(&batch);

    let mut ranked: Vec<RankedCandidate> = batch
        .into_iter()
        .map(|metrics| {
            let tie_break = bounds.normalized_sum(&metrics, CandidateMetrics::FIELDS);
            RankedCandidate { metrics, tie_break }
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.metrics
            .sla_violations
            .cmp(&b.metrics.sla_violations)
            .then(a.tie_break.total_cmp(&b.tie_break))
    });
    ranked
}

#[cfg(test)]
mod tests {
    use edgesched_model::ServerId;

    use super::*;
    use crate::paths::PathDelay;
    use crate::scorer::ApplicationField;

    fn app(id: u32, delay_score: f64, privacy_score: f64) -> ApplicationMetrics {
        ApplicationMetrics {
            application: id,
            number_of_services: 1,
            delay_sla: 10.0,
            delay_score,
            privacy_score,
        }
    }

    fn candidate(server: ServerId, violations: u8, affected: f64, power: f64, delay: f64) -> CandidateMetrics {
        CandidateMetrics {
            server,
            sla_violations: violations,
            delay_cost: PathDelay::Finite(delay),
            power_consumption: power,
            affected_services_cost: affected,
        }
    }

    fn order(ranked: &[RankedCandidate]) -> Vec<ServerId> {
        ranked.iter().map(|c| c.metrics.server).collect()
    }

    #[test]
    fn most_constrained_application_first() {
        let ranked = rank_applications(vec![app(1, 0.1, 1.0), app(2, 0.5, 4.0), app(3, 0.3, 2.0)]);
        let ids: Vec<u32> = ranked.iter().map(|a| a.metrics.application).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranked[0].priority, 2.0);
        assert_eq!(ranked[2].priority, 0.0);
    }

    #[test]
    fn equal_priorities_keep_discovery_order() {
        let ranked = rank_applications(vec![app(7, 0.2, 1.0), app(3, 0.2, 1.0), app(5, 0.2, 1.0)]);
        let ids: Vec<u32> = ranked.iter().map(|a| a.metrics.application).collect();
        assert_eq!(ids, vec![7, 3, 5]);
        assert!(ranked.iter().all(|a| a.priority == 2.0));
    }

    #[test]
    fn normalized_scores_peak_at_one() {
        let batch = vec![app(1, 0.0, 2.0), app(2, 0.4, 3.0)];
        let bounds = BatchBounds::compute(&batch);
        assert_eq!(bounds.normalize(&batch[1], ApplicationField::DelayScore), 1.0);
        assert_eq!(bounds.normalize(&batch[0], ApplicationField::PrivacyScore), 0.0);
    }

    #[test]
    fn violations_dominate_cost() {
        let ranked = rank_candidates(vec![
            candidate(1, 1, 0.0, 1.0, 0.0),
            candidate(2, 0, 9.0, 9.0, 9.0),
            candidate(3, 2, 0.0, 0.0, 0.0),
        ]);
        assert_eq!(order(&ranked), vec![2, 1, 3]);
    }

    #[test]
    fn equal_violations_sorted_by_composite_cost() {
        let ranked = rank_candidates(vec![
            candidate(1, 0, 2.0, 10.0, 4.0),
            candidate(2, 0, 0.0, 10.0, 2.0),
            candidate(3, 0, 1.0, 20.0, 0.0),
        ]);
        // Tie-breaks: 1 → 1 + 0 + 1 = 2, 2 → 0 + 0 + 0.5 = 0.5, 3 → 0.5 + 1 + 0 = 1.5.
        assert_eq!(order(&ranked), vec![2, 3, 1]);
        assert_eq!(ranked[0].tie_break, 0.5);
    }

    #[test]
    fn equal_keys_keep_discovery_order() {
        let ranked = rank_candidates(vec![
            candidate(4, 0, 1.0, 5.0, 0.0),
            candidate(2, 0, 1.0, 5.0, 0.0),
            candidate(9, 0, 1.0, 5.0, 0.0),
        ]);
        assert_eq!(order(&ranked), vec![4, 2, 9]);
    }

    #[test]
    fn higher_affected_cost_never_ranks_better() {
        let base = vec![candidate(1, 0, 1.0, 5.0, 1.0), candidate(2, 0, 1.0, 5.0, 1.0)];
        for extra in [0.5, 1.0, 10.0, 1000.0] {
            let mut batch = base.clone();
            batch[0].affected_services_cost += extra;
            let ranked = rank_candidates(batch);
            assert_eq!(order(&ranked), vec![2, 1]);
        }
    }

    #[test]
    fn unreachable_delay_cost_normalizes_to_worst() {
        let mut far = candidate(1, 1, 0.0, 5.0, 0.0);
        far.delay_cost = PathDelay::Unreachable;
        let ranked = rank_candidates(vec![
            far,
            candidate(2, 1, 0.0, 5.0, 3.0),
            candidate(3, 1, 0.0, 5.0, 1.0),
        ]);
        // The unreachable candidate ties with the slowest reachable one and
        // keeps its discovery position ahead of it.
        assert_eq!(order(&ranked), vec![3, 1, 2]);
        assert_eq!(ranked[1].tie_break, ranked[2].tie_break);
    }

    #[test]
    fn ranking_is_idempotent() {
        let batch = vec![
            candidate(1, 0, 0.3, 4.0, 2.0),
            candidate(2, 1, 0.1, 2.0, 1.0),
            candidate(3, 0, 0.3, 4.0, 2.0),
        ];
        assert_eq!(rank_candidates(batch.clone()), rank_candidates(batch));
    }
}
