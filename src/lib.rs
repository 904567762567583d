//! # datasweep
//!
//! Reachability analysis for project asset stores.
//!
//! datasweep builds a dependency graph over every asset in a project
//! snapshot, marks everything reachable from the scene roots, and reports
//! the rest as unused. Verdicts are cached per generation so repeated
//! queries against an unchanged project are O(1).
//!
//! ## Key Features
//!
//! - **Graph-based**: all reference kinds (material slots, node trees,
//!   modifiers, constraints, collection hierarchies) become typed edges
//! - **Incremental**: scans run in cancellable batches with progress
//! - **Generation-cached**: verdicts invalidate lazily on store change
//! - **Linkage-aware**: library-linked and override data is never touched
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use datasweep::{Analyzer, MemSnapshot, AssetId};
//!
//! let snapshot: MemSnapshot = serde_json::from_str("{}").unwrap();
//! let mut analyzer = Analyzer::default();
//!
//! // Classify one asset under the current generation
//! let verdict = analyzer.classify(&snapshot, AssetId(42));
//! ```

pub mod analyzer;
pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod scan;
pub mod snapshot;

// Re-exports for convenience
pub use error::{Result, SweepError};

// Core surface
pub use analyzer::{Analyzer, SessionHandle};
pub use config::ScanConfig;
pub use graph::{mark, probe, DepGraph, Edge, EdgeKind, GraphStats, NodeData, Probe, Verdict};
pub use scan::{Advance, FinalResult, ProgressEvent, ScanMode, ScanSession};
pub use snapshot::{
    AssetId, AssetRecord, Category, Generation, Linkage, MemSnapshot, PropMap, PropValue, Snapshot,
};

#[cfg(test)]
mod tests {
    use super::*;
    use snapshot::PropValue;

    fn slot(material: u64) -> PropValue {
        PropValue::Struct(
            [("material".to_string(), PropValue::Ref(AssetId(material)))]
                .into_iter()
                .collect(),
        )
    }

    /// A small but representative project: a scene with a collection
    /// hierarchy, an object carrying a material, a node-group chain hanging
    /// off that material, and several orphans.
    fn project() -> MemSnapshot {
        let mut snap = MemSnapshot::new();
        snap.insert(
            AssetRecord::new(1, "Scene", Category::Scene)
                .prop("collection", PropValue::Ref(AssetId(10))),
        );
        snap.insert(
            AssetRecord::new(10, "Master Collection", Category::Collection)
                .prop("children", PropValue::List(vec![PropValue::Ref(AssetId(11))])),
        );
        snap.insert(
            AssetRecord::new(11, "Props", Category::Collection)
                .prop("objects", PropValue::List(vec![PropValue::Ref(AssetId(20))])),
        );
        snap.insert(
            AssetRecord::new(20, "Cube", Category::Object)
                .prop("material_slots", PropValue::List(vec![slot(30)])),
        );
        snap.insert(
            AssetRecord::new(30, "Metal", Category::Material).prop(
                "nodes",
                PropValue::List(vec![PropValue::Struct(
                    [("group".to_string(), PropValue::Ref(AssetId(40)))]
                        .into_iter()
                        .collect(),
                )]),
            ),
        );
        snap.insert(
            AssetRecord::new(40, "Scratches", Category::NodeGroup).prop(
                "nodes",
                PropValue::List(vec![PropValue::Struct(
                    [("group".to_string(), PropValue::Ref(AssetId(41)))]
                        .into_iter()
                        .collect(),
                )]),
            ),
        );
        snap.insert(AssetRecord::new(41, "Noise", Category::NodeGroup));
        // Orphans of various categories.
        snap.insert(AssetRecord::new(50, "OldMetal", Category::Material));
        snap.insert(AssetRecord::new(51, "unused.png", Category::Image));
        snap.insert(AssetRecord::new(52, "StrayGroup", Category::NodeGroup));
        snap
    }

    fn scan_all(analyzer: &mut Analyzer, snap: &MemSnapshot) -> FinalResult {
        let handle = analyzer.start_scan(vec![], ScanMode::Full);
        loop {
            match analyzer.advance(snap, handle).unwrap() {
                Advance::Done(result) => return result,
                Advance::Progress(_) => {}
                Advance::Cancelled => panic!("unexpected cancel"),
            }
        }
    }

    #[test]
    fn soundness_chain_through_node_groups() {
        let snap = project();
        let mut analyzer = Analyzer::default();
        let result = scan_all(&mut analyzer, &snap);

        // Everything on the scene chain, including the group-in-group leaf,
        // is used; only the three orphans surface.
        assert_eq!(
            result.unused,
            vec![AssetId(50), AssetId(51), AssetId(52)]
        );
        assert_eq!(
            analyzer.classify(&snap, AssetId(41)).unwrap(),
            Verdict::Used
        );
    }

    #[test]
    fn removing_the_slot_orphans_the_chain() {
        let mut snap = project();
        let mut analyzer = Analyzer::default();
        assert_eq!(
            analyzer.classify(&snap, AssetId(30)).unwrap(),
            Verdict::Used
        );

        // Clear the cube's material slot and rescan.
        if let Some(cube) = snap.get_mut(AssetId(20)) {
            cube.props
                .insert("material_slots".to_string(), PropValue::List(vec![]));
        }
        analyzer.notify_changed();

        let result = scan_all(&mut analyzer, &snap);
        assert!(result.unused.contains(&AssetId(30)));
        assert!(result.unused.contains(&AssetId(40)));
        assert!(result.unused.contains(&AssetId(41)));
        assert!(!result.unused.contains(&AssetId(20)));
    }

    #[test]
    fn linked_assets_are_invisible_to_the_scan() {
        let mut snap = project();
        snap.insert(AssetRecord::new(60, "linked_mat", Category::Material).linked());
        // A local object using only a linked material still keeps nothing
        // local alive through it.
        snap.insert(
            AssetRecord::new(61, "LinkedUser", Category::Object)
                .prop("material_slots", PropValue::List(vec![slot(60)])),
        );

        let mut analyzer = Analyzer::default();
        let result = scan_all(&mut analyzer, &snap);
        assert!(!result.unused.contains(&AssetId(60)));
        assert!(matches!(
            analyzer.classify(&snap, AssetId(60)),
            Err(SweepError::ExcludedLinkage(_))
        ));
    }

    #[test]
    fn node_group_cycle_terminates() {
        let mut snap = MemSnapshot::new();
        // Ten groups in a ring, detached from any root.
        for i in 0..10u64 {
            let next = 100 + (i + 1) % 10;
            snap.insert(
                AssetRecord::new(100 + i, format!("G{i}"), Category::NodeGroup).prop(
                    "nodes",
                    PropValue::List(vec![PropValue::Struct(
                        [("group".to_string(), PropValue::Ref(AssetId(next)))]
                            .into_iter()
                            .collect(),
                    )]),
                ),
            );
        }

        let mut analyzer = Analyzer::default();
        let result = scan_all(&mut analyzer, &snap);
        assert_eq!(result.unused.len(), 10);
    }

    #[test]
    fn pinned_assets_held_by_default() {
        let mut snap = project();
        snap.insert(AssetRecord::new(70, "KeepMe", Category::Material).pinned());

        let mut analyzer = Analyzer::default();
        let result = scan_all(&mut analyzer, &snap);
        assert!(!result.unused.contains(&AssetId(70)));

        // With pin respect off the same asset is fair game.
        let mut loose = Analyzer::new(ScanConfig {
            respect_pinned: false,
            ..ScanConfig::default()
        });
        let result = scan_all(&mut loose, &snap);
        assert!(result.unused.contains(&AssetId(70)));
    }

    #[test]
    fn classify_is_cached_until_notified() {
        let snap = project();
        let mut analyzer = Analyzer::default();
        let first = analyzer.classify(&snap, AssetId(50)).unwrap();
        let second = analyzer.classify(&snap, AssetId(50)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, Verdict::Unused);

        let before = analyzer.generation();
        analyzer.notify_changed();
        assert_ne!(before, analyzer.generation());
        // Still unused after a rescan; the bump alone changes nothing.
        assert_eq!(
            analyzer.classify(&snap, AssetId(50)).unwrap(),
            Verdict::Unused
        );
    }

    #[test]
    fn cancelled_scan_leaves_no_verdicts() {
        let snap = project();
        let mut analyzer = Analyzer::new(ScanConfig {
            heavy_batch_size: 1,
            light_batch_size: 1,
            ..ScanConfig::default()
        });
        let handle = analyzer.start_scan(vec![], ScanMode::Full);
        analyzer.advance(&snap, handle).unwrap();
        analyzer.advance(&snap, handle).unwrap();
        analyzer.cancel(handle).unwrap();
        assert!(matches!(
            analyzer.advance(&snap, handle).unwrap(),
            Advance::Cancelled
        ));

        // A later full classify still works and is correct.
        assert_eq!(
            analyzer.classify(&snap, AssetId(50)).unwrap(),
            Verdict::Unused
        );
    }

    #[test]
    fn probe_on_partial_graph() {
        let mut graph = DepGraph::new(Generation(1));
        graph.upsert(NodeData {
            id: AssetId(1),
            category: Category::Scene,
            label: "Scene".into(),
            usage_hint: 0,
            protected: false,
        });
        graph.upsert(NodeData {
            id: AssetId(30),
            category: Category::Material,
            label: "Metal".into(),
            usage_hint: 1,
            protected: false,
        });
        graph.add_edges(
            AssetId(1),
            &[Edge::new(AssetId(30), EdgeKind::MaterialSlot)],
        );

        let roots = [AssetId(1)].into_iter().collect();
        // Positive answers are safe before finalization, negatives are not.
        assert_eq!(probe(&graph, &roots, AssetId(30)), Probe::Used);
        assert_eq!(probe(&graph, &roots, AssetId(50)), Probe::Inconclusive);
    }

    #[test]
    fn snapshot_round_trips_through_json() {
        let snap = project();
        let text = serde_json::to_string(&snap).unwrap();
        let back: MemSnapshot = serde_json::from_str(&text).unwrap();

        let mut a = Analyzer::default();
        let mut b = Analyzer::default();
        assert_eq!(scan_all(&mut a, &snap).unused, scan_all(&mut b, &back).unused);
    }
}
