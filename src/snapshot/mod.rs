//! Snapshot data model: the read-only view of the external asset store.
//!
//! Defines asset identity, categories, linkage, the generic structured
//! property tree the extractor walks, and the [`Snapshot`] accessor trait
//! that isolates the core from the host application. [`MemSnapshot`] is the
//! in-memory implementation used by tests and the CLI.

pub mod shim;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;

/// Stable identity of an asset: the underlying store's opaque handle.
/// Never a display name; names may collide or be reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssetId(pub u64);

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic version counter for the dependency-graph snapshot. Bumped
/// whenever the caller signals that the underlying store changed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// The category of an asset. Determines which extraction rules apply.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Scene,
    Object,
    Mesh,
    Material,
    Image,
    NodeGroup,
    Texture,
    Light,
    Armature,
    World,
    Collection,
    ParticleSettings,
    Action,
    Library,
}

impl Category {
    /// Every category, in scan order.
    pub const ALL: [Category; 14] = [
        Category::Scene,
        Category::Collection,
        Category::Object,
        Category::Mesh,
        Category::Material,
        Category::NodeGroup,
        Category::Image,
        Category::Texture,
        Category::Light,
        Category::Armature,
        Category::World,
        Category::ParticleSettings,
        Category::Action,
        Category::Library,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Scene => "scene",
            Category::Object => "object",
            Category::Mesh => "mesh",
            Category::Material => "material",
            Category::Image => "image",
            Category::NodeGroup => "node_group",
            Category::Texture => "texture",
            Category::Light => "light",
            Category::Armature => "armature",
            Category::World => "world",
            Category::Collection => "collection",
            Category::ParticleSettings => "particle_settings",
            Category::Action => "action",
            Category::Library => "library",
        };
        write!(f, "{name}")
    }
}

/// Whether an asset is local project data, pulled read-only from an external
/// library, or a local override of such linked data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Linkage {
    Local,
    LibraryLinked,
    Override,
}

impl Linkage {
    /// Linked and override data is excluded from analysis entirely: it is
    /// never classified and no edge into or out of it enters the graph.
    pub fn is_excluded(self) -> bool {
        matches!(self, Linkage::LibraryLinked | Linkage::Override)
    }
}

/// String-keyed structured property map, the unit of reflective walking.
pub type PropMap = BTreeMap<String, PropValue>;

/// A node in an asset's structured property tree, as exposed by the store's
/// introspection layer. Reference fields are what the generic extraction
/// pass follows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropValue {
    /// Reference to another asset.
    Ref(AssetId),
    /// Ordered collection (slot arrays, modifier stacks, node lists).
    List(Vec<PropValue>),
    /// Nested structure (a modifier, a node, a socket).
    Struct(PropMap),
    Bool(bool),
    Int(i64),
    Str(String),
}

impl PropValue {
    pub fn as_ref_id(&self) -> Option<AssetId> {
        match self {
            PropValue::Ref(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[PropValue]> {
        match self {
            PropValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&PropMap> {
        match self {
            PropValue::Struct(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

/// One asset as seen through the snapshot accessor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: AssetId,
    /// Display label only, used in progress events and diagnostics,
    /// never for identity.
    pub name: String,
    pub category: Category,
    #[serde(default = "default_linkage")]
    pub linkage: Linkage,
    /// External-store reference count. Fast-path hint only; can overcount
    /// relative to true reachability (e.g. references from other
    /// unreachable assets).
    #[serde(default)]
    pub usage_hint: u32,
    /// Caller asked for this asset to survive cleanup even when unreferenced
    /// (the store's "protector" flag).
    #[serde(default)]
    pub pinned: bool,
    /// Built-in store buffers that must never be flagged unused
    /// (render results, viewer buffers).
    #[serde(default)]
    pub protected: bool,
    /// Multi-tile texture sets: tiles sharing a group id form one logical
    /// asset; any tile's use marks the whole group used.
    #[serde(default)]
    pub tile_group: Option<u32>,
    /// Structured properties exposed by the store's introspection layer.
    #[serde(default)]
    pub props: PropMap,
}

fn default_linkage() -> Linkage {
    Linkage::Local
}

impl AssetRecord {
    pub fn new(id: u64, name: impl Into<String>, category: Category) -> Self {
        Self {
            id: AssetId(id),
            name: name.into(),
            category,
            linkage: Linkage::Local,
            usage_hint: 0,
            pinned: false,
            protected: false,
            tile_group: None,
            props: PropMap::new(),
        }
    }

    pub fn linked(mut self) -> Self {
        self.linkage = Linkage::LibraryLinked;
        self
    }

    pub fn overridden(mut self) -> Self {
        self.linkage = Linkage::Override;
        self
    }

    pub fn pinned(mut self) -> Self {
        self.pinned = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn usage_hint(mut self, hint: u32) -> Self {
        self.usage_hint = hint;
        self
    }

    pub fn tile_group(mut self, group: u32) -> Self {
        self.tile_group = Some(group);
        self
    }

    pub fn prop(mut self, key: impl Into<String>, value: PropValue) -> Self {
        self.props.insert(key.into(), value);
        self
    }
}

/// Read-only view of the asset store for one scan generation.
///
/// The store must not be mutated while a scan session is in `Building` or
/// `Reducing`; the core never requests mutation itself.
pub trait Snapshot {
    /// Schema version of the store, consumed only by [`shim`].
    fn schema_version(&self) -> u32;

    /// Look up a single asset. `None` for dangling handles; the extractor
    /// treats those as malformed references and skips them.
    fn get(&self, id: AssetId) -> Option<&AssetRecord>;

    /// Enumerate every asset of a category. Failure here is fatal for the
    /// running session and surfaces as an aborted scan.
    fn assets_of(&self, category: Category) -> Result<Vec<AssetId>>;
}

/// In-memory snapshot, serializable as JSON. The CLI loads these from disk;
/// tests build them directly.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemSnapshot {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub assets: BTreeMap<AssetId, AssetRecord>,
}

fn default_schema_version() -> u32 {
    shim::CURRENT_SCHEMA
}

impl MemSnapshot {
    pub fn new() -> Self {
        Self {
            schema_version: shim::CURRENT_SCHEMA,
            assets: BTreeMap::new(),
        }
    }

    pub fn with_schema(schema_version: u32) -> Self {
        Self {
            schema_version,
            assets: BTreeMap::new(),
        }
    }

    /// Insert or replace an asset record. Returns its id for chaining into
    /// property refs.
    pub fn insert(&mut self, record: AssetRecord) -> AssetId {
        let id = record.id;
        self.assets.insert(id, record);
        id
    }

    pub fn remove(&mut self, id: AssetId) -> Option<AssetRecord> {
        self.assets.remove(&id)
    }

    /// Mutable access to one asset's record, for tests that mutate the
    /// snapshot between generations.
    pub fn get_mut(&mut self, id: AssetId) -> Option<&mut AssetRecord> {
        self.assets.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

impl Snapshot for MemSnapshot {
    fn schema_version(&self) -> u32 {
        self.schema_version
    }

    fn get(&self, id: AssetId) -> Option<&AssetRecord> {
        self.assets.get(&id)
    }

    fn assets_of(&self, category: Category) -> Result<Vec<AssetId>> {
        Ok(self
            .assets
            .values()
            .filter(|a| a.category == category)
            .map(|a| a.id)
            .collect())
    }
}

/// Snapshot wrapper that fails enumeration, for exercising the abort path.
#[cfg(test)]
pub(crate) struct FailingSnapshot;

#[cfg(test)]
impl Snapshot for FailingSnapshot {
    fn schema_version(&self) -> u32 {
        shim::CURRENT_SCHEMA
    }

    fn get(&self, _id: AssetId) -> Option<&AssetRecord> {
        None
    }

    fn assets_of(&self, _category: Category) -> Result<Vec<AssetId>> {
        Err(crate::error::SweepError::SnapshotAccess(
            "store went away".to_string(),
        ))
    }
}
