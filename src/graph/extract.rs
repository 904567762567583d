//! Reference extraction: enumerates one asset's outgoing uses-edges.
//!
//! Two passes: a generic reflective walk over the asset's structured
//! properties, and category-specific semantic rules for the references the
//! generic walk cannot interpret correctly (slot arrays, node sockets,
//! modifier stacks, instanced collections, tile groups). The two passes may
//! discover the same target; the graph dedupes on `(from, to, kind)` and
//! reachability is unaffected.
//!
//! Extraction is total: a malformed or dangling reference is skipped with a
//! diagnostic and never aborts the scan.

use tracing::{debug, warn};

use super::types::{Edge, EdgeKind};
use crate::snapshot::{shim, AssetRecord, Category, PropMap, PropValue, Snapshot};

/// Default bound on the structural walk, protecting against malformed or
/// adversarial self-referential schemas.
pub const DEFAULT_MAX_STRUCT_DEPTH: usize = 5;

/// Extract all outgoing uses-edges of one asset. Read-only; never mutates
/// the asset or the store.
pub fn extract(snap: &dyn Snapshot, asset: &AssetRecord, max_depth: usize) -> Vec<Edge> {
    // No edge leaves an excluded asset: linked/override data is outside the
    // analyzed graph entirely.
    if asset.linkage.is_excluded() {
        return Vec::new();
    }

    let mut edges = Vec::new();
    structural_pass(snap, asset, &asset.props, 0, max_depth, &mut edges);
    semantic_pass(snap, asset, &mut edges);
    edges
}

/// Validate a candidate target and push the edge. Dangling handles and
/// excluded-linkage targets are dropped with a diagnostic.
fn push_ref(
    snap: &dyn Snapshot,
    from: &AssetRecord,
    to: crate::snapshot::AssetId,
    kind: EdgeKind,
    edges: &mut Vec<Edge>,
) {
    match snap.get(to) {
        Some(target) if target.linkage.is_excluded() => {
            // Invariant: no edge into linked/override data.
        }
        Some(_) => edges.push(Edge::new(to, kind)),
        None => {
            debug!(from = %from.id, %to, %kind, "dangling reference skipped");
        }
    }
}

// ─── Generic Structural Pass ────────────────────────────────────

fn structural_pass(
    snap: &dyn Snapshot,
    asset: &AssetRecord,
    props: &PropMap,
    depth: usize,
    max_depth: usize,
    edges: &mut Vec<Edge>,
) {
    if depth >= max_depth {
        // Depth overflow degrades to "stop descending": the asset stays
        // partially analyzed rather than failing extraction.
        debug!(asset = %asset.id, depth, "struct depth limit hit, not descending further");
        return;
    }
    for value in props.values() {
        walk_value(snap, asset, value, depth, max_depth, edges);
    }
}

fn walk_value(
    snap: &dyn Snapshot,
    asset: &AssetRecord,
    value: &PropValue,
    depth: usize,
    max_depth: usize,
    edges: &mut Vec<Edge>,
) {
    match value {
        PropValue::Ref(id) => push_ref(snap, asset, *id, EdgeKind::StructRef, edges),
        // List descent counts against the bound like struct descent does;
        // otherwise nested lists recurse without limit.
        PropValue::List(items) => {
            if depth + 1 >= max_depth {
                debug!(asset = %asset.id, depth, "struct depth limit hit, not descending further");
                return;
            }
            for item in items {
                walk_value(snap, asset, item, depth + 1, max_depth, edges);
            }
        }
        PropValue::Struct(map) => {
            structural_pass(snap, asset, map, depth + 1, max_depth, edges);
        }
        PropValue::Bool(_) | PropValue::Int(_) | PropValue::Str(_) => {}
    }
}

// ─── Semantic Override Pass ─────────────────────────────────────

fn semantic_pass(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    match asset.category {
        Category::Object => extract_object(snap, asset, edges),
        Category::Collection => extract_collection(snap, asset, edges),
        Category::Scene => extract_scene(snap, asset, edges),
        Category::Material | Category::NodeGroup | Category::World => {
            extract_node_tree(snap, asset, edges);
        }
        Category::Texture => {
            extract_node_tree(snap, asset, edges);
            // Legacy single-image field on textures without a node tree.
            if let Some(image) = asset.props.get("image").and_then(|v| v.as_ref_id()) {
                push_ref(snap, asset, image, EdgeKind::TextureSlot, edges);
            }
        }
        Category::ParticleSettings => extract_particle_settings(snap, asset, edges),
        Category::Image => extract_image(snap, asset, edges),
        // Packed/embedded data presence is an attribute, never an edge, and
        // these categories carry no semantic rules beyond the generic walk.
        Category::Mesh
        | Category::Light
        | Category::Armature
        | Category::Action
        | Category::Library => {}
    }
}

fn extract_object(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    // Material slots.
    for slot in structs_in(asset, "material_slots") {
        if let Some(mat) = slot.get("material").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, mat, EdgeKind::MaterialSlot, edges);
        }
    }

    // Modifier stack. A disabled modifier's references still count as usage;
    // the `enabled` flag is deliberately not consulted.
    for modifier in structs_in(asset, "modifiers") {
        if let Some(group) = shim::modifier_node_group(snap, modifier) {
            push_ref(snap, asset, group, EdgeKind::Modifier, edges);
        }
        for key in ["texture", "mask_texture"] {
            if let Some(tex) = modifier.get(key).and_then(|v| v.as_ref_id()) {
                push_ref(snap, asset, tex, EdgeKind::Modifier, edges);
            }
        }
    }

    // Constraints ("Child Of" style targets: armatures, other objects).
    for constraint in structs_in(asset, "constraints") {
        if let Some(target) = constraint.get("target").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, target, EdgeKind::Constraint, edges);
        }
    }

    // The object's data block (mesh, light, armature).
    if let Some(data) = asset.props.get("data").and_then(|v| v.as_ref_id()) {
        push_ref(snap, asset, data, EdgeKind::ObjectData, edges);
    }

    // Instanced collection: the instancing object uses the collection, and
    // members become reachable through the collection's own edges.
    if let Some(coll) = asset
        .props
        .get("instance_collection")
        .and_then(|v| v.as_ref_id())
    {
        push_ref(snap, asset, coll, EdgeKind::InstanceCollection, edges);
    }

    // Particle systems -> settings.
    for system in structs_in(asset, "particle_systems") {
        if let Some(settings) = system.get("settings").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, settings, EdgeKind::ParticleSystem, edges);
        }
    }
}

fn extract_collection(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    for obj in refs_in(asset, "objects") {
        push_ref(snap, asset, obj, EdgeKind::CollectionMember, edges);
    }
    for child in refs_in(asset, "children") {
        push_ref(snap, asset, child, EdgeKind::ChildCollection, edges);
    }
}

fn extract_scene(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    if let Some(coll) = asset.props.get("collection").and_then(|v| v.as_ref_id()) {
        push_ref(snap, asset, coll, EdgeKind::SceneCollection, edges);
    }
    if let Some(world) = asset.props.get("world").and_then(|v| v.as_ref_id()) {
        push_ref(snap, asset, world, EdgeKind::SceneWorld, edges);
    }
    // Compositor trees are matched by handle identity, never display name.
    for tree in shim::scene_compositor_trees(snap, asset) {
        push_ref(snap, asset, tree, EdgeKind::CompositorTree, edges);
    }
    if let Some(coll) = shim::rigidbody_world_collection(asset) {
        push_ref(snap, asset, coll, EdgeKind::RigidBodyWorld, edges);
    }
}

/// Node-tree carriers: materials, node groups, worlds, node-based textures.
/// Group nodes reference other NodeGroup assets, which extract their own
/// edges; chains of unused-looking intermediate groups resolve during
/// global reachability, never by local pruning here.
fn extract_node_tree(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    for node in structs_in(asset, "nodes") {
        if let Some(image) = node.get("image").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, image, EdgeKind::NodeImage, edges);
        }
        if let Some(group) = node.get("group").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, group, EdgeKind::GroupNode, edges);
        }
        if let Some(tex) = node.get("texture").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, tex, EdgeKind::NodeTexture, edges);
        }
        // Input-socket defaults: a material wired only into a "Set Material"
        // style input still counts as used.
        if let Some(inputs) = node.get("inputs").and_then(|v| v.as_list()) {
            for socket in inputs.iter().filter_map(|v| v.as_struct()) {
                if let Some(default) = socket.get("default").and_then(|v| v.as_ref_id()) {
                    push_ref(snap, asset, default, EdgeKind::NodeInput, edges);
                }
            }
        }
    }
}

fn extract_particle_settings(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    for slot in structs_in(asset, "texture_slots") {
        if let Some(tex) = slot.get("texture").and_then(|v| v.as_ref_id()) {
            push_ref(snap, asset, tex, EdgeKind::TextureSlot, edges);
        }
    }
}

/// Multi-tile image sets form one logical asset: every tile links its
/// siblings so that any reachable tile marks the whole group.
fn extract_image(snap: &dyn Snapshot, asset: &AssetRecord, edges: &mut Vec<Edge>) {
    let Some(group) = asset.tile_group else {
        return;
    };
    let images = match snap.assets_of(Category::Image) {
        Ok(images) => images,
        Err(err) => {
            warn!(asset = %asset.id, %err, "tile group enumeration failed, siblings skipped");
            return;
        }
    };
    for id in images {
        if id == asset.id {
            continue;
        }
        if snap.get(id).and_then(|img| img.tile_group) == Some(group) {
            push_ref(snap, asset, id, EdgeKind::TileSibling, edges);
        }
    }
}

// ─── Prop Helpers ───────────────────────────────────────────────

/// Structs inside a list-valued property; empty when the property is absent
/// or malformed.
fn structs_in<'a>(asset: &'a AssetRecord, key: &str) -> impl Iterator<Item = &'a PropMap> {
    asset
        .props
        .get(key)
        .and_then(|v| v.as_list())
        .unwrap_or(&[])
        .iter()
        .filter_map(|v| v.as_struct())
}

/// Refs inside a list-valued property.
fn refs_in<'a>(
    asset: &'a AssetRecord,
    key: &str,
) -> impl Iterator<Item = crate::snapshot::AssetId> + 'a {
    asset
        .props
        .get(key)
        .and_then(|v| v.as_list())
        .unwrap_or(&[])
        .iter()
        .filter_map(|v| v.as_ref_id())
}
