//! Root set resolution: the assets treated as inherently alive.
//!
//! Roots seed reachability: every local scene, every collection reachable
//! through a scene's collection hierarchy, the active compositor trees,
//! rigid-body world collections, and (when configured) pinned assets.
//! Library-linked and override candidates never become roots; they are
//! excluded from the analyzed graph entirely.

use std::collections::HashSet;
use tracing::debug;

use crate::config::ScanConfig;
use crate::error::Result;
use crate::snapshot::{shim, AssetId, Category, Snapshot};

/// Compute the root set for the current snapshot. Pure with respect to the
/// store; computed once per generation and never mutated mid-traversal.
pub fn resolve(snap: &dyn Snapshot, config: &ScanConfig) -> Result<HashSet<AssetId>> {
    let mut roots = HashSet::new();

    for scene_id in snap.assets_of(Category::Scene)? {
        let Some(scene) = snap.get(scene_id) else {
            continue;
        };
        if scene.linkage.is_excluded() {
            continue;
        }
        roots.insert(scene_id);

        // Scene collection hierarchy, transitively nested.
        if let Some(root_coll) = scene.props.get("collection").and_then(|v| v.as_ref_id()) {
            collect_collection_tree(snap, root_coll, &mut roots);
        }

        // Active compositor trees, matched by handle identity.
        for tree in shim::scene_compositor_trees(snap, scene) {
            insert_local(snap, tree, &mut roots);
        }

        // Rigid-body physics world collection.
        if let Some(coll) = shim::rigidbody_world_collection(scene) {
            collect_collection_tree(snap, coll, &mut roots);
        }
    }

    // Pinned assets survive cleanup even when unreferenced.
    if config.respect_pinned {
        for category in Category::ALL {
            for id in snap.assets_of(category)? {
                if let Some(asset) = snap.get(id) {
                    if asset.pinned && !asset.linkage.is_excluded() {
                        roots.insert(id);
                    }
                }
            }
        }
    }

    debug!(count = roots.len(), "root set resolved");
    Ok(roots)
}

/// Add a collection and all nested child collections. Iterative with a
/// visited check so collection cycles cannot loop.
fn collect_collection_tree(snap: &dyn Snapshot, start: AssetId, roots: &mut HashSet<AssetId>) {
    let mut worklist = vec![start];
    while let Some(id) = worklist.pop() {
        let Some(coll) = snap.get(id) else {
            debug!(%id, "dangling collection reference in scene hierarchy");
            continue;
        };
        if coll.linkage.is_excluded() || !roots.insert(id) {
            continue;
        }
        if let Some(children) = coll.props.get("children").and_then(|v| v.as_list()) {
            worklist.extend(children.iter().filter_map(|v| v.as_ref_id()));
        }
    }
}

fn insert_local(snap: &dyn Snapshot, id: AssetId, roots: &mut HashSet<AssetId>) {
    if let Some(asset) = snap.get(id) {
        if !asset.linkage.is_excluded() {
            roots.insert(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{AssetRecord, MemSnapshot, PropValue};

    fn ref_list(ids: &[u64]) -> PropValue {
        PropValue::List(ids.iter().map(|&id| PropValue::Ref(AssetId(id))).collect())
    }

    #[test]
    fn nested_collections_are_roots() {
        let mut snap = MemSnapshot::new();
        snap.insert(
            AssetRecord::new(1, "Scene", Category::Scene)
                .prop("collection", PropValue::Ref(AssetId(2))),
        );
        snap.insert(
            AssetRecord::new(2, "Master", Category::Collection).prop("children", ref_list(&[3])),
        );
        snap.insert(
            AssetRecord::new(3, "Nested", Category::Collection).prop("children", ref_list(&[4])),
        );
        snap.insert(AssetRecord::new(4, "Deep", Category::Collection));
        snap.insert(AssetRecord::new(5, "Orphan", Category::Collection));

        let roots = resolve(&snap, &ScanConfig::default()).unwrap();
        for id in [1, 2, 3, 4] {
            assert!(roots.contains(&AssetId(id)), "missing root {id}");
        }
        assert!(!roots.contains(&AssetId(5)));
    }

    #[test]
    fn collection_cycle_terminates() {
        let mut snap = MemSnapshot::new();
        snap.insert(
            AssetRecord::new(1, "Scene", Category::Scene)
                .prop("collection", PropValue::Ref(AssetId(2))),
        );
        snap.insert(
            AssetRecord::new(2, "A", Category::Collection).prop("children", ref_list(&[3])),
        );
        snap.insert(
            AssetRecord::new(3, "B", Category::Collection).prop("children", ref_list(&[2])),
        );

        let roots = resolve(&snap, &ScanConfig::default()).unwrap();
        assert!(roots.contains(&AssetId(2)));
        assert!(roots.contains(&AssetId(3)));
    }

    #[test]
    fn linked_candidates_never_roots() {
        let mut snap = MemSnapshot::new();
        snap.insert(AssetRecord::new(1, "LinkedScene", Category::Scene).linked());
        snap.insert(
            AssetRecord::new(2, "Scene", Category::Scene)
                .prop("collection", PropValue::Ref(AssetId(3))),
        );
        snap.insert(AssetRecord::new(3, "LinkedColl", Category::Collection).linked());
        snap.insert(AssetRecord::new(4, "PinnedLinked", Category::Material).linked().pinned());

        let roots = resolve(&snap, &ScanConfig::default()).unwrap();
        assert_eq!(roots, [AssetId(2)].into_iter().collect());
    }

    #[test]
    fn pinned_assets_respect_config() {
        let mut snap = MemSnapshot::new();
        snap.insert(AssetRecord::new(1, "KeepMe", Category::Material).pinned());

        let on = resolve(&snap, &ScanConfig::default()).unwrap();
        assert!(on.contains(&AssetId(1)));

        let config = ScanConfig {
            respect_pinned: false,
            ..ScanConfig::default()
        };
        let off = resolve(&snap, &config).unwrap();
        assert!(!off.contains(&AssetId(1)));
    }

    #[test]
    fn rigidbody_and_compositor_roots() {
        let mut snap = MemSnapshot::new();
        snap.insert(
            AssetRecord::new(1, "Scene", Category::Scene)
                .prop(
                    "rigidbody_world",
                    PropValue::Struct(
                        [("collection".to_string(), PropValue::Ref(AssetId(2)))]
                            .into_iter()
                            .collect(),
                    ),
                )
                .prop("compositor_trees", ref_list(&[3])),
        );
        snap.insert(AssetRecord::new(2, "Physics", Category::Collection));
        snap.insert(AssetRecord::new(3, "Comp", Category::NodeGroup));

        let roots = resolve(&snap, &ScanConfig::default()).unwrap();
        assert!(roots.contains(&AssetId(2)));
        assert!(roots.contains(&AssetId(3)));
    }
}
