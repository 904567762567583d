//! Schema-version normalization for snapshot properties.
//!
//! Host schema generations rename fields and flip singular fields into
//! plural ones. Everything version-dependent is resolved here; the rest of
//! the core reads through these accessors and never branches on
//! `schema_version` itself.

use super::{AssetId, AssetRecord, PropMap, Snapshot};

/// Newest schema generation this crate understands.
pub const CURRENT_SCHEMA: u32 = 2;

/// Compositor node trees attached to a scene.
///
/// Schema 1 exposes a single `compositor_tree` reference; schema 2 and later
/// expose a `compositor_trees` list. Matching is by handle identity; tree
/// display names are not unique across scenes.
pub fn scene_compositor_trees(snap: &dyn Snapshot, scene: &AssetRecord) -> Vec<AssetId> {
    if snap.schema_version() >= 2 {
        scene
            .props
            .get("compositor_trees")
            .and_then(|v| v.as_list())
            .map(|items| items.iter().filter_map(|v| v.as_ref_id()).collect())
            .unwrap_or_default()
    } else {
        scene
            .props
            .get("compositor_tree")
            .and_then(|v| v.as_ref_id())
            .into_iter()
            .collect()
    }
}

/// The node group driving a geometry-nodes style modifier.
///
/// Schema 1 called the field `group`; schema 2 renamed it to `node_group`.
pub fn modifier_node_group(snap: &dyn Snapshot, modifier: &PropMap) -> Option<AssetId> {
    let key = if snap.schema_version() >= 2 {
        "node_group"
    } else {
        "group"
    };
    modifier.get(key).and_then(|v| v.as_ref_id())
}

/// The collection owned by a scene's rigid-body physics world, if any.
pub fn rigidbody_world_collection(scene: &AssetRecord) -> Option<AssetId> {
    scene
        .props
        .get("rigidbody_world")
        .and_then(|v| v.as_struct())
        .and_then(|world| world.get("collection"))
        .and_then(|v| v.as_ref_id())
}
