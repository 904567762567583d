//! Dependency graph module, the structural backbone of datasweep.
//!
//! Provides the graph data model, the petgraph-backed engine, reference
//! extraction, root resolution, and reachability traversal.

pub mod engine;
pub mod extract;
pub mod reach;
pub mod roots;
pub mod types;

pub use engine::{DepGraph, GraphStats};
pub use extract::{extract, DEFAULT_MAX_STRUCT_DEPTH};
pub use reach::{mark, probe, Probe};
pub use types::{Edge, EdgeKind, NodeData, Verdict};
