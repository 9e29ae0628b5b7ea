//! Minimum-delay paths over the network topology.
//!
//! The topology is static for one run, so every `(origin, target)` query is
//! memoized, misses included. A new run must start from a fresh oracle or
//! call [`PathOracle::reset`].

use std::collections::HashMap;

use edgesched_model::{SwitchId, Topology};
use petgraph::algo::astar;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::{PlacementError, PlacementResult};

/// A minimum-delay path and its summed link delay.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Vec<SwitchId>,
    pub delay: f64,
}

/// Delay between two locations, or the fact that none exists.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathDelay {
    Finite(f64),
    Unreachable,
}

impl PathDelay {
    pub fn finite(self) -> Option<f64> {
        match self {
            Self::Finite(delay) => Some(delay),
            Self::Unreachable => None,
        }
    }

    /// Sum of two delays; unreachable absorbs everything.
    pub fn plus(self, other: PathDelay) -> PathDelay {
        match (self, other) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a + b),
            _ => Self::Unreachable,
        }
    }

    /// True only for a finite delay not exceeding `limit`.
    pub fn within(self, limit: f64) -> bool {
        matches!(self, Self::Finite(delay) if delay <= limit)
    }
}

/// Shortest-path oracle with a per-run cache.
#[derive(Debug, Clone)]
pub struct PathOracle {
    graph: UnGraph<SwitchId, f64>,
    locations: HashMap<SwitchId, NodeIndex>,
    /// `None` records a pair known to be disconnected.
    cache: HashMap<(SwitchId, SwitchId), Option<Route>>,
    hits: u64,
    misses: u64,
}

impl PathOracle {
    /// Build the delay graph for one run.
    pub fn new(topology: &Topology) -> Self {
        let mut graph = UnGraph::with_capacity(topology.switches.len(), topology.links.len());
        let mut locations = HashMap::with_capacity(topology.switches.len());
        for &switch in &topology.switches {
            locations.insert(switch, graph.add_node(switch));
        }
        for link in &topology.links {
            let [a, b] = link.nodes;
            if let (Some(&a), Some(&b)) = (locations.get(&a), locations.get(&b)) {
                graph.add_edge(a, b, link.delay);
            }
        }
        Self {
            graph,
            locations,
            cache: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Minimum-delay path from `origin` to `target`.
    ///
    /// `Ok(None)` means the two locations are not connected.
    pub fn shortest_delay_path(
        &mut self,
        origin: SwitchId,
        target: SwitchId,
    ) -> PlacementResult<Option<&Route>> {
        let key = (origin, target);
        if self.cache.contains_key(&key) {
            self.hits += 1;
        } else {
            self.misses += 1;
            let route = self.compute(origin, target)?;
            if route.is_none() {
                debug!(origin, target, "no path between switches");
            }
            self.cache.insert(key, route);
        }
        Ok(self.cache.get(&key).and_then(Option::as_ref))
    }

    /// Total delay from `origin` to `target`.
    pub fn delay(&mut self, origin: SwitchId, target: SwitchId) -> PlacementResult<PathDelay> {
        Ok(match self.shortest_delay_path(origin, target)? {
            Some(route) => PathDelay::Finite(route.delay),
            None => PathDelay::Unreachable,
        })
    }

    /// Drop every memoized path.
    pub fn reset(&mut self) {
        self.cache.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn cached_pairs(&self) -> usize {
        self.cache.len()
    }

    /// `(hits, misses)` since construction or the last reset.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    fn compute(&self, origin: SwitchId, target: SwitchId) -> PlacementResult<Option<Route>> {
        let start = self.location(origin)?;
        let goal = self.location(target)?;

        // A zero heuristic makes A* plain Dijkstra; link delays are non-negative.
        let found = astar(&self.graph, start, |n| n == goal, |e| *e.weight(), |_| 0.0);

        Ok(found.map(|(delay, nodes)| Route {
            path: nodes.into_iter().map(|n| self.graph[n]).collect(),
            delay,
        }))
    }

    fn location(&self, switch: SwitchId) -> PlacementResult<NodeIndex> {
        self.locations
            .get(&switch)
            .copied()
            .ok_or(PlacementError::UnknownLocation(switch))
    }
}

#[cfg(test)]
mod tests {
    use edgesched_model::Link;

    use super::*;

    fn link(a: SwitchId, b: SwitchId, delay: f64) -> Link {
        Link { nodes: [a, b], delay }
    }

    /// 1 -5- 2 -5- 3, plus a slow shortcut 1 -20- 3 and an isolated switch 4.
    fn topology() -> Topology {
        Topology {
            switches: vec![1, 2, 3, 4],
            links: vec![link(1, 2, 5.0), link(2, 3, 5.0), link(1, 3, 20.0)],
        }
    }

    #[test]
    fn picks_minimum_delay_not_fewest_hops() {
        let mut oracle = PathOracle::new(&topology());
        let route = oracle.shortest_delay_path(1, 3).unwrap().unwrap();
        assert_eq!(route.path, vec![1, 2, 3]);
        assert_eq!(route.delay, 10.0);
    }

    #[test]
    fn same_location_has_zero_delay() {
        let mut oracle = PathOracle::new(&topology());
        assert_eq!(oracle.delay(2, 2).unwrap(), PathDelay::Finite(0.0));
    }

    #[test]
    fn links_are_undirected() {
        let mut oracle = PathOracle::new(&topology());
        assert_eq!(oracle.delay(3, 1).unwrap(), PathDelay::Finite(10.0));
    }

    #[test]
    fn disconnected_pair_is_unreachable() {
        let mut oracle = PathOracle::new(&topology());
        assert_eq!(oracle.delay(1, 4).unwrap(), PathDelay::Unreachable);
        assert!(oracle.shortest_delay_path(4, 1).unwrap().is_none());
    }

    #[test]
    fn unknown_switch_is_an_error() {
        let mut oracle = PathOracle::new(&topology());
        assert!(matches!(
            oracle.delay(1, 99),
            Err(PlacementError::UnknownLocation(99))
        ));
    }

    #[test]
    fn repeated_queries_hit_the_cache() {
        let mut oracle = PathOracle::new(&topology());
        oracle.delay(1, 3).unwrap();
        oracle.delay(1, 3).unwrap();
        oracle.delay(1, 4).unwrap();
        oracle.delay(1, 4).unwrap();

        assert_eq!(oracle.cache_stats(), (2, 2));
        assert_eq!(oracle.cached_pairs(), 2);
    }

    #[test]
    fn reset_discards_cache() {
        let mut oracle = PathOracle::new(&topology());
        oracle.delay(1, 3).unwrap();
        oracle.reset();

        assert_eq!(oracle.cached_pairs(), 0);
        assert_eq!(oracle.cache_stats(), (0, 0));
        assert_eq!(oracle.delay(1, 3).unwrap(), PathDelay::Finite(10.0));
    }

    #[test]
    fn unreachable_absorbs_addition() {
        assert_eq!(
            PathDelay::Finite(1.0).plus(PathDelay::Finite(2.0)),
            PathDelay::Finite(3.0)
        );
        assert_eq!(
            PathDelay::Finite(1.0).plus(PathDelay::Unreachable),
            PathDelay::Unreachable
        );
        assert!(PathDelay::Finite(3.0).within(3.0));
        assert!(!PathDelay::Unreachable.within(f64::MAX));
    }
}
