//! Incremental scan session.
//!
//! Time-slices graph construction into cancellable batches driven by
//! repeated [`ScanSession::advance`] calls from a cooperative scheduler.
//! State machine: `Idle -> Building -> Reducing -> Done | Cancelled`.
//! Building processes one bounded batch per call and yields a progress
//! event; Reducing runs reachability in one step once the graph is fully
//! materialized, which is what makes verdicts deterministic regardless of
//! batch ordering.

use serde::Serialize;
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::{debug, info};

use crate::config::ScanConfig;
use crate::error::Result;
use crate::graph::{extract, mark, roots, DepGraph, GraphStats, NodeData};
use crate::snapshot::{AssetId, Category, Generation, Snapshot};

/// How the session traverses once the graph is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Traverse to completion and return the complete unused set. Used by
    /// the destructive clean path.
    Full,
    /// Per requested category, short-circuit after the first unused asset.
    /// The result carries at most one exemplar per category; counts are
    /// existence indicators, not totals.
    Probe,
}

/// Progress of a running scan.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressEvent {
    pub processed: usize,
    pub total: usize,
    /// Label of the most recently extracted asset.
    pub current_label: String,
}

/// Outcome of a completed scan.
#[derive(Debug, Clone, Serialize)]
pub struct FinalResult {
    /// Unused assets of the requested categories, sorted by id. Reachable
    /// assets and excluded-linkage data never appear here.
    pub unused: Vec<AssetId>,
    /// Unused count per requested category.
    pub per_category: BTreeMap<Category, usize>,
    /// Size of the graph the verdicts were computed on.
    pub stats: GraphStats,
}

/// What one `advance` call produced.
#[derive(Debug, Clone)]
pub enum Advance {
    Progress(ProgressEvent),
    Done(FinalResult),
    Cancelled,
}

enum State {
    Idle,
    Building {
        graph: DepGraph,
        root_set: HashSet<AssetId>,
        queue: VecDeque<AssetId>,
        processed: usize,
        total: usize,
        last_label: String,
    },
    Reducing {
        graph: DepGraph,
        root_set: HashSet<AssetId>,
    },
    Done(FinalResult),
    Cancelled,
}

/// One user-invoked classification pass. Created per operation; holds no
/// state shared with other sessions.
pub struct ScanSession {
    generation: Generation,
    categories: Vec<Category>,
    mode: ScanMode,
    config: ScanConfig,
    state: State,
    cancel_requested: bool,
}

impl ScanSession {
    /// `categories` filters which assets are *reported*; the graph itself is
    /// always built over every category, since reachability of one category
    /// can flow through any other. An empty list means all categories.
    pub fn new(
        generation: Generation,
        categories: Vec<Category>,
        mode: ScanMode,
        config: ScanConfig,
    ) -> Self {
        let categories = if categories.is_empty() {
            Category::ALL.to_vec()
        } else {
            categories
        };
        Self {
            generation,
            categories,
            mode,
            config,
            state: State::Idle,
            cancel_requested: false,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Done(_) | State::Cancelled)
    }

    /// Request cancellation. Observed at the next batch boundary; latency is
    /// bounded by one batch's extraction cost.
    pub fn cancel(&mut self) {
        self.cancel_requested = true;
    }

    /// Drive the session one step. Errors from the snapshot accessor abort
    /// the session and surface to the caller.
    pub fn advance(&mut self, snap: &dyn Snapshot) -> Result<Advance> {
        if self.cancel_requested && !matches!(self.state, State::Done(_)) {
            // Partial graph state is discarded; a cancelled scan guarantees
            // no verdicts.
            info!(generation = %self.generation, "scan cancelled");
            self.state = State::Cancelled;
            return Ok(Advance::Cancelled);
        }

        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => self.start(snap),
            State::Building {
                graph,
                root_set,
                queue,
                processed,
                total,
                last_label,
            } => self.build_batch(snap, graph, root_set, queue, processed, total, last_label),
            State::Reducing { graph, root_set } => Ok(self.reduce(&graph, &root_set)),
            State::Done(result) => {
                self.state = State::Done(result.clone());
                Ok(Advance::Done(result))
            }
            State::Cancelled => {
                self.state = State::Cancelled;
                Ok(Advance::Cancelled)
            }
        }
    }

    /// Idle -> Building: resolve roots, seed the graph with every local
    /// asset, and queue extraction work in category scan order.
    fn start(&mut self, snap: &dyn Snapshot) -> Result<Advance> {
        let root_set = roots::resolve(snap, &self.config)?;
        let mut graph = DepGraph::new(self.generation);
        let mut queue = VecDeque::new();

        for category in Category::ALL {
            for id in snap.assets_of(category)? {
                let Some(asset) = snap.get(id) else { continue };
                // Excluded linkage never enters the analyzed graph.
                if asset.linkage.is_excluded() {
                    continue;
                }
                graph.upsert(NodeData {
                    id,
                    category,
                    label: asset.name.clone(),
                    usage_hint: asset.usage_hint,
                    protected: asset.protected,
                });
                queue.push_back(id);
            }
        }

        let total = queue.len();
        debug!(generation = %self.generation, total, "scan session building");
        let event = ProgressEvent {
            processed: 0,
            total,
            current_label: String::new(),
        };
        self.state = State::Building {
            graph,
            root_set,
            queue,
            processed: 0,
            total,
            last_label: String::new(),
        };
        Ok(Advance::Progress(event))
    }

    /// Building -> Building | Reducing: extract one bounded batch.
    #[allow(clippy::too_many_arguments)]
    fn build_batch(
        &mut self,
        snap: &dyn Snapshot,
        mut graph: DepGraph,
        root_set: HashSet<AssetId>,
        mut queue: VecDeque<AssetId>,
        mut processed: usize,
        total: usize,
        mut last_label: String,
    ) -> Result<Advance> {
        let batch_size = queue
            .front()
            .and_then(|&id| graph.node(id))
            .map(|node| self.config.batch_size(node.category))
            .unwrap_or(1);

        for _ in 0..batch_size {
            let Some(id) = queue.pop_front() else { break };
            // Extraction is total: faults inside are logged and skipped,
            // never propagated.
            if let Some(asset) = snap.get(id) {
                let edges = extract::extract(snap, asset, self.config.max_struct_depth);
                graph.add_edges(id, &edges);
                last_label = asset.name.clone();
            } else {
                debug!(%id, "asset vanished between enumeration and extraction");
            }
            processed += 1;
        }

        let event = ProgressEvent {
            processed,
            total,
            current_label: last_label.clone(),
        };
        if queue.is_empty() {
            graph.finalize();
            self.state = State::Reducing { graph, root_set };
        } else {
            self.state = State::Building {
                graph,
                root_set,
                queue,
                processed,
                total,
                last_label,
            };
        }
        Ok(Advance::Progress(event))
    }

    /// Reducing -> Done: one reachability pass over the finalized graph.
    /// Not further time-sliced; traversal is fast relative to extraction.
    fn reduce(&mut self, graph: &DepGraph, root_set: &HashSet<AssetId>) -> Advance {
        let reachable = mark(graph, root_set);

        let mut unused = Vec::new();
        let mut per_category = BTreeMap::new();
        for &category in &self.categories {
            let mut ids: Vec<AssetId> = graph
                .nodes()
                .filter(|node| {
                    node.category == category
                        && !node.protected
                        && !reachable.contains(&node.id)
                })
                .map(|node| node.id)
                .collect();
            ids.sort_unstable();
            if self.mode == ScanMode::Probe {
                ids.truncate(1);
            }
            per_category.insert(category, ids.len());
            unused.extend(ids);
        }
        unused.sort_unstable();

        info!(
            generation = %self.generation,
            unused = unused.len(),
            "scan session complete"
        );
        let result = FinalResult {
            unused,
            per_category,
            stats: graph.stats(),
        };
        self.state = State::Done(result.clone());
        Advance::Done(result)
    }

    /// Verdict lookup against a finished session, for cache filling.
    /// `None` until the session reaches `Done`.
    pub fn result(&self) -> Option<&FinalResult> {
        match &self.state {
            State::Done(result) => Some(result),
            _ => None,
        }
    }
}
