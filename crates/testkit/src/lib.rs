#![warn(missing_docs)]
//! Test fixtures: stub packs, fixed repository sources and id helpers.

use packweave_core::{
    OverrideDirection, Pack, PackLocationInfo, PackMetadata, PackRef, PackResources,
    PackSelectionConfig, PackSource, PackType, RepositorySource, Resource, ResourceLocation,
    PACK_SECTION,
};
use std::sync::Arc;

/// A pack with an id, metadata and no contents.
#[derive(Debug, Clone)]
pub struct StubPack {
    info: PackLocationInfo,
    metadata: Option<PackMetadata>,
}

impl StubPack {
    /// Stub server data pack with valid metadata.
    pub fn new(id: &str) -> Self {
        Self {
            info: PackLocationInfo {
                id: id.to_string(),
                title: id.to_string(),
                source: PackSource::Runtime,
                known_pack: None,
            },
            metadata: Some(PackMetadata {
                description: format!("stub pack {id}"),
                pack_format: PackType::ServerData.current_pack_format(),
            }),
        }
    }

    /// Drop the `pack` section, so adapters refuse the pack.
    pub fn without_metadata(mut self) -> Self {
        self.metadata = None;
        self
    }

    /// Override the provenance.
    pub fn with_source(mut self, source: PackSource) -> Self {
        self.info.source = source;
        self
    }

    /// Share as an opaque handle.
    pub fn into_ref(self) -> PackRef {
        Arc::new(self)
    }
}

impl PackResources for StubPack {
    fn location(&self) -> &PackLocationInfo {
        &self.info
    }

    fn metadata_section(&self, name: &str) -> Option<serde_json::Value> {
        if name != PACK_SECTION {
            return None;
        }
        self.metadata
            .as_ref()
            .and_then(|meta| serde_json::to_value(meta).ok())
    }

    fn root_resource(&self, _segments: &[&str]) -> Option<Resource> {
        None
    }

    fn get_resource(&self, _domain: PackType, _location: &ResourceLocation) -> Option<Resource> {
        None
    }

    fn list_resources(
        &self,
        _domain: PackType,
        _namespace: &str,
        _prefix: &str,
        _out: &mut dyn FnMut(ResourceLocation, Resource),
    ) {
    }

    fn namespaces(&self, _domain: PackType) -> Vec<String> {
        Vec::new()
    }
}

/// Stub pack handle with the given id.
pub fn stub(id: &str) -> PackRef {
    StubPack::new(id).into_ref()
}

/// Stub pack handles for each id, in order.
pub fn stubs(ids: &[&str]) -> Vec<PackRef> {
    ids.iter().map(|id| stub(id)).collect()
}

/// Stub repository entry as a user folder would produce it.
pub fn user_pack(id: &str) -> Pack {
    let resources = StubPack::new(id).with_source(PackSource::Default).into_ref();
    Pack::with_selection(
        resources,
        PackType::ServerData,
        PackSelectionConfig {
            required: false,
            default_position: OverrideDirection::Top,
            fixed_position: false,
        },
    )
    .expect("stub packs carry metadata")
}

/// Pack ids of handles, in order.
pub fn ids(packs: &[PackRef]) -> Vec<String> {
    packs.iter().map(|pack| pack.pack_id().to_string()).collect()
}

/// Pack ids of repository entries, in order.
pub fn pack_ids(packs: &[Pack]) -> Vec<String> {
    packs.iter().map(|pack| pack.id().to_string()).collect()
}

/// A repository source that replays a fixed list of packs on every load.
#[derive(Debug, Clone, Default)]
pub struct FixedSource {
    packs: Vec<Pack>,
    /// Number of times the source was loaded.
    pub loads: usize,
}

impl FixedSource {
    /// Source replaying `packs`.
    pub fn new(packs: Vec<Pack>) -> Self {
        Self { packs, loads: 0 }
    }
}

impl RepositorySource for FixedSource {
    fn load_packs(&mut self, consumer: &mut dyn FnMut(Pack)) {
        self.loads += 1;
        for pack in &self.packs {
            consumer(pack.clone());
        }
    }
}
