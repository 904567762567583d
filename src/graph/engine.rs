//! The dependency graph engine.
//!
//! Uses petgraph to store assets and their uses-edges, with an index for
//! stable-handle lookup. Built fresh per scan generation, append-only while
//! building, frozen by [`DepGraph::finalize`].

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::types::{Edge, EdgeKind, NodeData};
use crate::snapshot::{AssetId, Generation};

/// In-memory directed graph of assets and uses-edges for one generation.
pub struct DepGraph {
    generation: Generation,
    graph: DiGraph<NodeData, EdgeKind>,
    /// Index: stable asset handle -> node index.
    index: HashMap<AssetId, NodeIndex>,
    /// Guard against duplicate `(from, to, kind)` triples.
    edge_set: HashSet<(AssetId, AssetId, EdgeKind)>,
    finalized: bool,
}

impl DepGraph {
    pub fn new(generation: Generation) -> Self {
        Self {
            generation,
            graph: DiGraph::new(),
            index: HashMap::new(),
            edge_set: HashSet::new(),
            finalized: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Whether building finished and the graph is frozen for traversal.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Freeze the graph. Probe-mode negative answers become authoritative
    /// only after this point.
    pub fn finalize(&mut self) {
        self.finalized = true;
        debug!(
            generation = %self.generation,
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            "dependency graph finalized"
        );
    }

    // ─── Node Operations ────────────────────────────────────────

    /// Add an asset node, or return the existing index for its id.
    pub fn upsert(&mut self, data: NodeData) -> NodeIndex {
        if let Some(&idx) = self.index.get(&data.id) {
            return idx;
        }
        let id = data.id;
        let idx = self.graph.add_node(data);
        self.index.insert(id, idx);
        idx
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node(&self, id: AssetId) -> Option<&NodeData> {
        self.index.get(&id).map(|&idx| &self.graph[idx])
    }

    /// Iterate over every node payload in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeData> {
        self.graph.node_weights()
    }

    // ─── Edge Operations ────────────────────────────────────────

    /// Add the outgoing edges of one asset. Both endpoints must already be
    /// upserted; an edge to an unknown node is dropped with a diagnostic
    /// (dangling handles are the extractor's skip-and-continue faults).
    /// Duplicate `(from, to, kind)` triples are suppressed.
    pub fn add_edges(&mut self, from: AssetId, edges: &[Edge]) {
        let Some(&from_idx) = self.index.get(&from) else {
            debug!(%from, "edge source not in graph, dropping its edges");
            return;
        };
        for edge in edges {
            let Some(&to_idx) = self.index.get(&edge.to) else {
                debug!(%from, to = %edge.to, kind = %edge.kind, "edge target not in graph, dropped");
                continue;
            };
            if self.edge_set.insert((from, edge.to, edge.kind)) {
                self.graph.add_edge(from_idx, to_idx, edge.kind);
            }
        }
    }

    // ─── Query Operations ───────────────────────────────────────

    /// Targets of this asset's outgoing uses-edges.
    pub fn neighbors_out(&self, id: AssetId) -> Vec<AssetId> {
        self.directed_neighbors(id, Direction::Outgoing)
    }

    /// Sources of uses-edges into this asset.
    pub fn neighbors_in(&self, id: AssetId) -> Vec<AssetId> {
        self.directed_neighbors(id, Direction::Incoming)
    }

    fn directed_neighbors(&self, id: AssetId, dir: Direction) -> Vec<AssetId> {
        let Some(&idx) = self.index.get(&id) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, dir)
            .map(|e| match dir {
                Direction::Outgoing => self.graph[e.target()].id,
                Direction::Incoming => self.graph[e.source()].id,
            })
            .collect()
    }

    /// Number of incoming edges discovered so far.
    pub fn incoming_count(&self, id: AssetId) -> usize {
        self.index
            .get(&id)
            .map(|&idx| self.graph.edges_directed(idx, Direction::Incoming).count())
            .unwrap_or(0)
    }

    /// Fast-path hint while the graph is still being populated: an asset
    /// with a zero external usage counter and no incoming edge discovered so
    /// far is provisionally unused, subject to revision if later extraction
    /// adds an edge before the generation is finalized. Never authoritative.
    pub fn provisionally_unused(&self, id: AssetId) -> bool {
        match self.node(id) {
            Some(data) => data.usage_hint == 0 && self.incoming_count(id) == 0,
            None => false,
        }
    }

    // ─── Stats ──────────────────────────────────────────────────

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            total_nodes: self.graph.node_count(),
            total_edges: self.graph.edge_count(),
        }
    }
}

/// Statistics about the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Category;

    fn node(id: u64, category: Category) -> NodeData {
        NodeData {
            id: AssetId(id),
            category,
            label: format!("asset-{id}"),
            usage_hint: 0,
            protected: false,
        }
    }

    #[test]
    fn empty_graph() {
        let graph = DepGraph::new(Generation(1));
        let stats = graph.stats();
        assert_eq!(stats.total_nodes, 0);
        assert_eq!(stats.total_edges, 0);
        assert!(!graph.is_finalized());
    }

    #[test]
    fn upsert_is_idempotent() {
        let mut graph = DepGraph::new(Generation(1));
        let a = graph.upsert(node(1, Category::Object));
        let b = graph.upsert(node(1, Category::Object));
        assert_eq!(a, b);
        assert_eq!(graph.stats().total_nodes, 1);
    }

    #[test]
    fn duplicate_edges_suppressed() {
        let mut graph = DepGraph::new(Generation(1));
        graph.upsert(node(1, Category::Object));
        graph.upsert(node(2, Category::Material));

        let edge = Edge::new(AssetId(2), EdgeKind::MaterialSlot);
        graph.add_edges(AssetId(1), &[edge, edge]);
        graph.add_edges(AssetId(1), &[edge]);
        assert_eq!(graph.stats().total_edges, 1);

        // Same endpoints, different kind: a distinct edge.
        graph.add_edges(AssetId(1), &[Edge::new(AssetId(2), EdgeKind::NodeInput)]);
        assert_eq!(graph.stats().total_edges, 2);
    }

    #[test]
    fn edge_to_unknown_target_dropped() {
        let mut graph = DepGraph::new(Generation(1));
        graph.upsert(node(1, Category::Object));
        graph.add_edges(AssetId(1), &[Edge::new(AssetId(99), EdgeKind::Modifier)]);
        assert_eq!(graph.stats().total_edges, 0);
        assert!(graph.neighbors_out(AssetId(1)).is_empty());
    }

    #[test]
    fn neighbors_both_directions() {
        let mut graph = DepGraph::new(Generation(1));
        graph.upsert(node(1, Category::Object));
        graph.upsert(node(2, Category::Material));
        graph.add_edges(AssetId(1), &[Edge::new(AssetId(2), EdgeKind::MaterialSlot)]);

        assert_eq!(graph.neighbors_out(AssetId(1)), vec![AssetId(2)]);
        assert_eq!(graph.neighbors_in(AssetId(2)), vec![AssetId(1)]);
        assert_eq!(graph.incoming_count(AssetId(2)), 1);
        assert_eq!(graph.incoming_count(AssetId(1)), 0);
    }

    #[test]
    fn provisional_fast_path() {
        let mut graph = DepGraph::new(Generation(1));
        graph.upsert(node(1, Category::Object));
        graph.upsert(node(2, Category::Material));
        let mut hinted = node(3, Category::Material);
        hinted.usage_hint = 2;
        graph.upsert(hinted);

        // No incoming edge, zero hint: provisionally unused.
        assert!(graph.provisionally_unused(AssetId(2)));
        // Non-zero external counter blocks the fast path even with no edges.
        assert!(!graph.provisionally_unused(AssetId(3)));

        // A later-discovered edge revises the answer.
        graph.add_edges(AssetId(1), &[Edge::new(AssetId(2), EdgeKind::MaterialSlot)]);
        assert!(!graph.provisionally_unused(AssetId(2)));

        // Unknown asset never takes the fast path.
        assert!(!graph.provisionally_unused(AssetId(42)));
    }
}
