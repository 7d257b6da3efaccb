//! Pack handles and the adapter that turns bare pack resources into
//! repository entries.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::{OverrideDirection, PackType, ResourceLocation};

/// Name of the metadata section every pack must carry.
pub const PACK_SECTION: &str = "pack";

/// File contents served by a pack.
pub type Resource = Arc<[u8]>;

/// Shared, opaque handle to a pack.
///
/// The ordering engine only records identity and position of these; it never
/// looks inside.
pub type PackRef = Arc<dyn PackResources>;

/// Identifies a pack the client and server both know, so it need not be
/// transferred or flagged as experimental.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KnownPack {
    /// Owning namespace (usually the mod id).
    pub namespace: String,
    /// Pack id within the namespace.
    pub id: String,
    /// Version string, typically the owning mod's version.
    pub version: String,
}

impl fmt::Display for KnownPack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.namespace, self.id, self.version)
    }
}

/// Where a pack came from. Drives how its title is decorated and whether the
/// host enables it without user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackSource {
    /// Shipped with the game.
    BuiltIn,
    /// Provided by a feature flag.
    Feature,
    /// Found in a world's datapack folder.
    World,
    /// Sent by a server.
    Server,
    /// Found in a user folder.
    Default,
    /// Generated at runtime by a mod.
    Runtime,
}

impl PackSource {
    /// Title shown in the pack selection screen.
    pub fn decorate(self, title: &str) -> String {
        match self {
            PackSource::BuiltIn => format!("{title} (built-in)"),
            PackSource::Feature => format!("{title} (feature)"),
            PackSource::World => format!("{title} (world)"),
            PackSource::Server => format!("{title} (server)"),
            PackSource::Default => title.to_string(),
            PackSource::Runtime => format!("{title} (runtime generated)"),
        }
    }

    /// Whether the host selects packs from this source automatically.
    pub fn should_add_automatically(self) -> bool {
        matches!(
            self,
            PackSource::BuiltIn | PackSource::Server | PackSource::Runtime
        )
    }
}

/// Identity and provenance of a pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackLocationInfo {
    /// Pack id, unique within a repository.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Provenance.
    pub source: PackSource,
    /// Known-pack triple, if any.
    pub known_pack: Option<KnownPack>,
}

/// The `pack` metadata section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackMetadata {
    /// Description shown under the title.
    pub description: String,
    /// Pack format the pack targets.
    pub pack_format: u32,
}

/// Read access to a pack's contents.
///
/// Implemented by every pack the engine can order: packs on disk, packs
/// built in memory at runtime, and test stubs.
pub trait PackResources: fmt::Debug + Send + Sync {
    /// Identity and provenance.
    fn location(&self) -> &PackLocationInfo;

    /// Look up a metadata section (`pack`, `features`, `filter`, ...) as JSON.
    fn metadata_section(&self, name: &str) -> Option<serde_json::Value>;

    /// A file at the pack root, such as `pack.png`.
    fn root_resource(&self, segments: &[&str]) -> Option<Resource>;

    /// A resource file of the given domain.
    fn get_resource(&self, domain: PackType, location: &ResourceLocation) -> Option<Resource>;

    /// Every resource of `domain` in `namespace` whose path starts with the
    /// directory `prefix`.
    fn list_resources(
        &self,
        domain: PackType,
        namespace: &str,
        prefix: &str,
        out: &mut dyn FnMut(ResourceLocation, Resource),
    );

    /// Namespaces that have at least one entry in `domain`.
    fn namespaces(&self, domain: PackType) -> Vec<String>;

    /// Pack id.
    fn pack_id(&self) -> &str {
        &self.location().id
    }

    /// Known-pack triple, if any.
    fn known_pack_info(&self) -> Option<&KnownPack> {
        self.location().known_pack.as_ref()
    }

    /// The decoded `pack` section, if present and well formed.
    fn pack_metadata(&self) -> Option<PackMetadata> {
        let section = self.metadata_section(PACK_SECTION)?;
        serde_json::from_value(section).ok()
    }
}

/// How the host treats a pack in its selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSelectionConfig {
    /// The user cannot disable the pack.
    pub required: bool,
    /// Side of the selection the pack is inserted on.
    pub default_position: OverrideDirection,
    /// The pack cannot be moved by the user.
    pub fixed_position: bool,
}

impl PackSelectionConfig {
    /// Selection for a runtime pack: optional, movable, inserted on `direction`.
    pub fn virtual_pack(direction: OverrideDirection) -> Self {
        Self {
            required: false,
            default_position: direction,
            fixed_position: false,
        }
    }
}

/// A repository entry: pack contents plus the selection rules the host uses to
/// place it.
#[derive(Debug, Clone)]
pub struct Pack {
    resources: PackRef,
    domain: PackType,
    metadata: PackMetadata,
    selection: PackSelectionConfig,
}

impl Pack {
    /// Wrap pack contents for a repository with an explicit override direction.
    ///
    /// Returns `None` (and logs) when the pack has no readable `pack` section,
    /// matching how the host refuses such packs.
    pub fn from_resources(
        resources: PackRef,
        domain: PackType,
        direction: OverrideDirection,
    ) -> Option<Self> {
        Self::with_selection(
            resources,
            domain,
            PackSelectionConfig::virtual_pack(direction),
        )
    }

    /// Wrap pack contents with an arbitrary selection config.
    pub fn with_selection(
        resources: PackRef,
        domain: PackType,
        selection: PackSelectionConfig,
    ) -> Option<Self> {
        let Some(metadata) = resources.pack_metadata() else {
            warn!(
                "Missing or invalid metadata in pack '{}', ignoring",
                resources.pack_id()
            );
            return None;
        };
        Some(Self {
            resources,
            domain,
            metadata,
            selection,
        })
    }

    /// Pack id.
    pub fn id(&self) -> &str {
        self.resources.pack_id()
    }

    /// The wrapped contents.
    pub fn resources(&self) -> &PackRef {
        &self.resources
    }

    /// Domain the entry was created for.
    pub fn domain(&self) -> PackType {
        self.domain
    }

    /// Decoded `pack` section.
    pub fn metadata(&self) -> &PackMetadata {
        &self.metadata
    }

    /// Selection rules.
    pub fn selection(&self) -> &PackSelectionConfig {
        &self.selection
    }

    /// Side of the selection the pack is inserted on.
    pub fn default_position(&self) -> OverrideDirection {
        self.selection.default_position
    }

    /// Whether the pack is outdated or too new for `domain`.
    pub fn is_compatible(&self) -> bool {
        self.metadata.pack_format == self.domain.current_pack_format()
    }
}
