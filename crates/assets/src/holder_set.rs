//! Holder sets that can be written before the game's registries exist.
//!
//! Generated data often refers to a tag (`"#c:gems"`) in a field that the
//! game reads as a holder set. At generation time there is nothing to bind
//! the tag to, so [`HolderSet::Dummy`] stands in and serializes as the bare
//! tag reference.

use std::fmt;

use packweave_core::ResourceLocation;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registries::{RegistryType, ResourceKey, TagKey};
use crate::PackError;

/// A set of registry elements, either listed or named by a tag.
#[derive(Clone, PartialEq, Eq)]
pub enum HolderSet<T> {
    /// Elements listed directly.
    Direct(Vec<ResourceKey<T>>),
    /// A tag whose contents are known.
    Named {
        /// The tag.
        tag: TagKey<T>,
        /// Resolved elements.
        contents: Vec<ResourceKey<T>>,
    },
    /// A tag with unknown contents. Only its reference can be written.
    Dummy(TagKey<T>),
}

impl<T: RegistryType> HolderSet<T> {
    /// A set listing `keys`.
    pub fn direct(keys: Vec<ResourceKey<T>>) -> Self {
        HolderSet::Direct(keys)
    }

    /// An unbound reference to `tag`.
    pub fn dummy(tag: TagKey<T>) -> Self {
        HolderSet::Dummy(tag)
    }

    /// Number of known elements. Always 0 for a dummy set.
    pub fn size(&self) -> usize {
        match self {
            HolderSet::Direct(keys) | HolderSet::Named { contents: keys, .. } => keys.len(),
            HolderSet::Dummy(_) => 0,
        }
    }

    /// Whether no elements are known.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Whether `key` is a known element.
    pub fn contains(&self, key: &ResourceKey<T>) -> bool {
        match self {
            HolderSet::Direct(keys) | HolderSet::Named { contents: keys, .. } => {
                keys.contains(key)
            }
            HolderSet::Dummy(_) => false,
        }
    }

    /// The tag this set is named by, if any.
    pub fn unwrap_key(&self) -> Option<&TagKey<T>> {
        match self {
            HolderSet::Direct(_) => None,
            HolderSet::Named { tag, .. } | HolderSet::Dummy(tag) => Some(tag),
        }
    }
}

impl<T: RegistryType> fmt::Debug for HolderSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolderSet::Direct(keys) => f.debug_tuple("Direct").field(keys).finish(),
            HolderSet::Named { tag, contents } => f
                .debug_struct("Named")
                .field("tag", tag)
                .field("contents", contents)
                .finish(),
            HolderSet::Dummy(tag) => write!(f, "DummyHolderSet[{tag:?}]"),
        }
    }
}

impl<T: RegistryType> Serialize for HolderSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            HolderSet::Direct(keys) => serializer.collect_seq(keys.iter().map(|k| k.location())),
            HolderSet::Named { tag, .. } | HolderSet::Dummy(tag) => {
                serializer.collect_str(tag)
            }
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum HolderSetRepr {
    Single(String),
    List(Vec<ResourceLocation>),
}

impl<'de, T: RegistryType> Deserialize<'de> for HolderSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match HolderSetRepr::deserialize(deserializer)? {
            HolderSetRepr::Single(raw) => match raw.strip_prefix('#') {
                Some(tag) => {
                    let location = ResourceLocation::parse(tag).map_err(serde::de::Error::custom)?;
                    Ok(HolderSet::Dummy(TagKey::new(location)))
                }
                None => {
                    let location = ResourceLocation::parse(&raw).map_err(serde::de::Error::custom)?;
                    Ok(HolderSet::Direct(vec![ResourceKey::new(location)]))
                }
            },
            HolderSetRepr::List(locations) => Ok(HolderSet::Direct(
                locations.into_iter().map(ResourceKey::new).collect(),
            )),
        }
    }
}

/// Hands out dummy holder sets for any tag of registry `T`.
///
/// Only tag lookups are meaningful at generation time; element lookups fail.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyHolderGetter;

impl DummyHolderGetter {
    /// A dummy set for `tag`.
    pub fn tag<T: RegistryType>(&self, tag: TagKey<T>) -> HolderSet<T> {
        HolderSet::Dummy(tag)
    }

    /// A dummy set for the tag at `location`.
    pub fn tag_at<T: RegistryType>(&self, location: ResourceLocation) -> HolderSet<T> {
        self.tag(TagKey::new(location))
    }

    /// Element lookups have no registry to consult.
    pub fn element<T: RegistryType>(
        &self,
        key: &ResourceKey<T>,
    ) -> Result<ResourceKey<T>, PackError> {
        Err(PackError::UnsupportedLookup(format!(
            "{} in registry {}",
            key.location(),
            T::REGISTRY
        )))
    }
}
