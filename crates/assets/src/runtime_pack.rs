//! In-memory packs built by producers at reload time.

use std::sync::Arc;

use packweave_core::{
    KnownPack, PackLocationInfo, PackMetadata, PackRef, PackResources, PackSource, PackType,
    Resource, ResourceLocation, PACK_SECTION,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::entries::PackEntry;
use crate::registries::{Advancement, Recipe, RegistryType, ResourceKey, TagKey};
use crate::tags::{TagBuilder, TagFile};
use crate::PackError;

/// Metadata section listing the feature flags a pack requires.
pub const FEATURES_SECTION: &str = "features";
/// Metadata section hiding resources of lower packs.
pub const FILTER_SECTION: &str = "filter";
/// Metadata section declaring format-dependent overlay directories.
pub const OVERLAYS_SECTION: &str = "overlays";

/// A pack whose files live in memory.
///
/// Build it with the `add_*` methods, then share it with
/// [`into_ref`](RuntimeResourcePack::into_ref) before handing it to a
/// producer's pack adder.
#[derive(Debug)]
pub struct RuntimeResourcePack {
    info: PackLocationInfo,
    metadata: PackMetadata,
    features: Option<Value>,
    filter: Option<Value>,
    overlays: Option<Value>,
    root: PackEntry,
}

impl RuntimeResourcePack {
    /// An empty pack.
    pub fn new(info: PackLocationInfo, metadata: PackMetadata) -> Self {
        Self {
            info,
            metadata,
            features: None,
            filter: None,
            overlays: None,
            root: PackEntry::default(),
        }
    }

    /// Location info for a runtime pack named `id`.
    ///
    /// The pack id is the path of `id`; the namespace and `version` form the
    /// known-pack triple so the host does not flag the pack as experimental.
    pub fn create_info(id: &ResourceLocation, title: &str, version: &str) -> PackLocationInfo {
        PackLocationInfo {
            id: id.path().to_string(),
            title: title.to_string(),
            source: PackSource::Runtime,
            known_pack: Some(KnownPack {
                namespace: id.namespace().to_string(),
                id: id.path().to_string(),
                version: version.to_string(),
            }),
        }
    }

    /// A `pack` section targeting the current format of `domain`.
    pub fn create_metadata(description: &str, domain: PackType) -> PackMetadata {
        PackMetadata {
            description: description.to_string(),
            pack_format: domain.current_pack_format(),
        }
    }

    /// Set the `features` section.
    pub fn with_features(&mut self, section: Value) -> &mut Self {
        self.features = Some(section);
        self
    }

    /// Set the `filter` section.
    pub fn with_filter(&mut self, section: Value) -> &mut Self {
        self.filter = Some(section);
        self
    }

    /// Set the `overlays` section.
    pub fn with_overlays(&mut self, section: Value) -> &mut Self {
        self.overlays = Some(section);
        self
    }

    /// Add a file at the pack root, such as `pack.png`.
    pub fn add_root_file(
        &mut self,
        path: &str,
        bytes: impl Into<Resource>,
    ) -> Result<&mut Self, PackError> {
        let segments = split_path(path);
        self.root.insert(&segments, bytes.into())?;
        Ok(self)
    }

    /// Store `bytes` at `location` in `domain`, replacing any file there.
    pub fn add_raw(
        &mut self,
        domain: PackType,
        location: &ResourceLocation,
        bytes: impl Into<Resource>,
    ) -> Result<&mut Self, PackError> {
        debug!("adding {domain} resource {location} to pack '{}'", self.info.id);
        let segments = resource_path(domain, location);
        self.root.insert(&segments, bytes.into())?;
        Ok(self)
    }

    /// Store `value` as JSON at `location` in `domain`.
    pub fn add_json<V: Serialize + ?Sized>(
        &mut self,
        domain: PackType,
        location: &ResourceLocation,
        value: &V,
    ) -> Result<&mut Self, PackError> {
        let bytes = serde_json::to_vec(value).map_err(|source| PackError::Serialize {
            path: location.to_string(),
            source,
        })?;
        self.add_raw(domain, location, bytes)
    }

    /// Store a registry element `id` of registry `T` in `domain`.
    pub fn add_resource<T: RegistryType, V: Serialize + ?Sized>(
        &mut self,
        domain: PackType,
        id: ResourceLocation,
        value: &V,
    ) -> Result<ResourceKey<T>, PackError> {
        let location = registry_file(&T::elements_dir(), &id)?;
        self.add_json(domain, &location, value)?;
        Ok(ResourceKey::new(id))
    }

    /// Store a recipe.
    pub fn add_recipe<V: Serialize + ?Sized>(
        &mut self,
        id: ResourceLocation,
        recipe: &V,
    ) -> Result<ResourceKey<Recipe>, PackError> {
        self.add_resource(PackType::ServerData, id, recipe)
    }

    /// Store an advancement.
    pub fn add_advancement<V: Serialize + ?Sized>(
        &mut self,
        id: ResourceLocation,
        advancement: &V,
    ) -> Result<ResourceKey<Advancement>, PackError> {
        self.add_resource(PackType::ServerData, id, advancement)
    }

    /// Store a tag file for `tag`.
    pub fn add_tag<T: RegistryType>(
        &mut self,
        tag: TagKey<T>,
        file: &TagFile,
    ) -> Result<TagKey<T>, PackError> {
        let location = registry_file(&T::tags_dir(), tag.location())?;
        self.add_json(PackType::ServerData, &location, file)?;
        Ok(tag)
    }

    /// Build and store a tag in one step.
    pub fn add_tag_with<T: RegistryType>(
        &mut self,
        location: ResourceLocation,
        build: impl FnOnce(&mut TagBuilder<T>),
    ) -> Result<TagKey<T>, PackError> {
        let mut builder = TagBuilder::new();
        build(&mut builder);
        self.add_tag(TagKey::new(location), &builder.build())
    }

    /// Share the finished pack.
    pub fn into_ref(self) -> PackRef {
        Arc::new(self)
    }
}

fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn resource_path(domain: PackType, location: &ResourceLocation) -> Vec<String> {
    let mut segments = vec![
        domain.directory().to_string(),
        location.namespace().to_string(),
    ];
    segments.extend(split_path(location.path()));
    segments
}

fn registry_file(dir: &[String], id: &ResourceLocation) -> Result<ResourceLocation, PackError> {
    let path = format!("{}/{}.json", dir.join("/"), id.path());
    Ok(ResourceLocation::new(id.namespace(), &path)?)
}

impl PackResources for RuntimeResourcePack {
    fn location(&self) -> &PackLocationInfo {
        &self.info
    }

    fn metadata_section(&self, name: &str) -> Option<Value> {
        match name {
            PACK_SECTION => serde_json::to_value(&self.metadata).ok(),
            FEATURES_SECTION => self.features.clone(),
            FILTER_SECTION => self.filter.clone(),
            OVERLAYS_SECTION => self.overlays.clone(),
            _ => None,
        }
    }

    fn root_resource(&self, segments: &[&str]) -> Option<Resource> {
        self.root
            .find(segments.iter().copied())
            .and_then(PackEntry::as_resource)
            .cloned()
    }

    fn get_resource(&self, domain: PackType, location: &ResourceLocation) -> Option<Resource> {
        let segments = resource_path(domain, location);
        self.root
            .find(segments.iter().map(String::as_str))
            .and_then(PackEntry::as_resource)
            .cloned()
    }

    fn list_resources(
        &self,
        domain: PackType,
        namespace: &str,
        prefix: &str,
        out: &mut dyn FnMut(ResourceLocation, Resource),
    ) {
        let prefix = split_path(prefix);
        let dir = [domain.directory(), namespace]
            .into_iter()
            .chain(prefix.iter().map(String::as_str));
        let Some(entry) = self.root.find(dir) else {
            return;
        };
        entry.for_each_resource(&mut |relative, resource| {
            let path = prefix
                .iter()
                .chain(relative)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("/");
            match ResourceLocation::new(namespace, &path) {
                Ok(location) => out(location, resource.clone()),
                Err(err) => error!(
                    "Invalid path in pack '{}': {namespace}:{path}, ignoring ({err})",
                    self.info.id
                ),
            }
        });
    }

    fn namespaces(&self, domain: PackType) -> Vec<String> {
        self.root
            .find([domain.directory()])
            .and_then(PackEntry::as_directory)
            .map(|children| {
                children
                    .iter()
                    .filter(|(_, child)| child.as_directory().is_some())
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default()
    }
}
