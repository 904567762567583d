//! Core types for the dependency graph.
//!
//! Defines edge kinds, the per-node payload, and the used/unused verdict.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::snapshot::{AssetId, Category};

/// The semantic kind of a uses-edge.
///
/// Kinds disambiguate references that look alike structurally but differ in
/// what counts as usage: a node group behind a disabled modifier still
/// counts, while packed-data presence never produces an edge at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Object material slot -> Material.
    MaterialSlot,
    /// Material referenced as a node input-socket default ("Set Material").
    NodeInput,
    /// Group node -> NodeGroup, including nested groups.
    GroupNode,
    /// Image-texture node -> Image.
    NodeImage,
    /// Texture node -> Texture.
    NodeTexture,
    /// Modifier -> referenced asset. Counts even when the modifier is
    /// disabled.
    Modifier,
    /// Constraint -> target ("Child Of" style references).
    Constraint,
    /// Object -> its data block (mesh, light, armature).
    ObjectData,
    /// Collection -> member object.
    CollectionMember,
    /// Collection -> nested child collection.
    ChildCollection,
    /// Object instancing a Collection.
    InstanceCollection,
    /// Scene -> its root collection.
    SceneCollection,
    /// Scene -> active compositor node tree.
    CompositorTree,
    /// Scene -> its world.
    SceneWorld,
    /// Scene's rigid-body world -> its collection.
    RigidBodyWorld,
    /// Object particle system -> ParticleSettings.
    ParticleSystem,
    /// Particle texture slot or legacy texture field -> Texture/Image.
    TextureSlot,
    /// Tiles of one multi-tile image set reference each other; any used
    /// tile marks the whole group.
    TileSibling,
    /// Found by the generic structural walk, no more specific kind.
    StructRef,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EdgeKind::MaterialSlot => "material_slot",
            EdgeKind::NodeInput => "node_input",
            EdgeKind::GroupNode => "group_node",
            EdgeKind::NodeImage => "node_image",
            EdgeKind::NodeTexture => "node_texture",
            EdgeKind::Modifier => "modifier",
            EdgeKind::Constraint => "constraint",
            EdgeKind::ObjectData => "object_data",
            EdgeKind::CollectionMember => "collection_member",
            EdgeKind::ChildCollection => "child_collection",
            EdgeKind::InstanceCollection => "instance_collection",
            EdgeKind::SceneCollection => "scene_collection",
            EdgeKind::CompositorTree => "compositor_tree",
            EdgeKind::SceneWorld => "scene_world",
            EdgeKind::RigidBodyWorld => "rigid_body_world",
            EdgeKind::ParticleSystem => "particle_system",
            EdgeKind::TextureSlot => "texture_slot",
            EdgeKind::TileSibling => "tile_sibling",
            EdgeKind::StructRef => "struct_ref",
        };
        write!(f, "{name}")
    }
}

/// A directed uses-edge produced by the reference extractor. The source
/// asset is implicit: extraction returns the outgoing edges of one asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub to: AssetId,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn new(to: AssetId, kind: EdgeKind) -> Self {
        Self { to, kind }
    }
}

/// Payload stored per graph node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub id: AssetId,
    pub category: Category,
    /// Display label for progress events and diagnostics.
    pub label: String,
    /// External-store reference count, fast-path hint only.
    pub usage_hint: u32,
    /// Built-in store buffers are never reported unused.
    pub protected: bool,
}

/// Classification outcome for one asset in one generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Used,
    Unused,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Used => write!(f, "used"),
            Verdict::Unused => write!(f, "unused"),
        }
    }
}
