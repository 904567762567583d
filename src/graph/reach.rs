//! Reachability over the dependency graph.
//!
//! Iterative worklist traversal, never recursion, so deep node-group
//! chains cannot overflow the stack. The visited set enqueues each asset at
//! most once, which also makes reference cycles terminate naturally.

use std::collections::{HashSet, VecDeque};
use tracing::debug;

use super::engine::DepGraph;
use crate::snapshot::AssetId;

/// Full mode: mark every asset reachable from the roots. Deterministic for
/// a fixed generation and root set.
pub fn mark(graph: &DepGraph, roots: &HashSet<AssetId>) -> HashSet<AssetId> {
    let mut visited: HashSet<AssetId> = HashSet::new();
    let mut worklist: VecDeque<AssetId> = VecDeque::new();

    for &root in roots {
        if graph.contains(root) && visited.insert(root) {
            worklist.push_back(root);
        }
    }

    while let Some(id) = worklist.pop_front() {
        for next in graph.neighbors_out(id) {
            if visited.insert(next) {
                worklist.push_back(next);
            }
        }
    }

    debug!(
        generation = %graph.generation(),
        reachable = visited.len(),
        "mark pass complete"
    );
    visited
}

/// Outcome of a probe-mode query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    /// Target proven reachable from the roots.
    Used,
    /// Target proven unreachable. Only produced on a finalized graph.
    Unused,
    /// The graph is still being populated and the target has not been
    /// reached yet; no negative answer can be given.
    Inconclusive,
}

/// Probe mode: answer reachability for a single target, short-circuiting as
/// soon as the target is reached. A negative answer requires the finalized
/// graph; on a partial graph an unreached target stays [`Probe::Inconclusive`].
pub fn probe(graph: &DepGraph, roots: &HashSet<AssetId>, target: AssetId) -> Probe {
    // A target the graph does not model (unknown id, excluded linkage) has
    // no verdict; "not modeled" must not read as "unreachable".
    if !graph.contains(target) {
        return Probe::Inconclusive;
    }
    if roots.contains(&target) {
        return Probe::Used;
    }

    let mut visited: HashSet<AssetId> = HashSet::new();
    let mut worklist: VecDeque<AssetId> = VecDeque::new();
    for &root in roots {
        if graph.contains(root) && visited.insert(root) {
            worklist.push_back(root);
        }
    }

    while let Some(id) = worklist.pop_front() {
        for next in graph.neighbors_out(id) {
            if next == target {
                return Probe::Used;
            }
            if visited.insert(next) {
                worklist.push_back(next);
            }
        }
    }

    if graph.is_finalized() {
        Probe::Unused
    } else {
        Probe::Inconclusive
    }
}
