//! Tag files and typed builders for them.

use std::marker::PhantomData;

use packweave_core::ResourceLocation;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::registries::{RegistryType, ResourceKey, TagKey};

/// One entry of a tag: an element or another tag, required or optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TagEntry {
    id: ResourceLocation,
    tag: bool,
    required: bool,
}

impl TagEntry {
    /// A required element.
    pub fn element(id: ResourceLocation) -> Self {
        Self {
            id,
            tag: false,
            required: true,
        }
    }

    /// An element that is skipped if it does not exist.
    pub fn optional_element(id: ResourceLocation) -> Self {
        Self {
            required: false,
            ..Self::element(id)
        }
    }

    /// A required nested tag.
    pub fn tag(id: ResourceLocation) -> Self {
        Self {
            id,
            tag: true,
            required: true,
        }
    }

    /// A nested tag that is skipped if it does not exist.
    pub fn optional_tag(id: ResourceLocation) -> Self {
        Self {
            required: false,
            ..Self::tag(id)
        }
    }

    /// Referenced location.
    pub fn id(&self) -> &ResourceLocation {
        &self.id
    }

    /// Whether the entry references a tag.
    pub fn is_tag(&self) -> bool {
        self.tag
    }

    /// Whether loading fails when the entry is missing.
    pub fn is_required(&self) -> bool {
        self.required
    }

    fn reference(&self) -> String {
        if self.tag {
            format!("#{}", self.id)
        } else {
            self.id.to_string()
        }
    }
}

#[derive(Serialize, Deserialize)]
struct OptionalEntry {
    id: String,
    required: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EntryRepr {
    Plain(String),
    Object(OptionalEntry),
}

impl Serialize for TagEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.required {
            serializer.serialize_str(&self.reference())
        } else {
            OptionalEntry {
                id: self.reference(),
                required: false,
            }
            .serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TagEntry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (reference, required) = match EntryRepr::deserialize(deserializer)? {
            EntryRepr::Plain(reference) => (reference, true),
            EntryRepr::Object(entry) => (entry.id, entry.required),
        };
        let (tag, raw) = match reference.strip_prefix('#') {
            Some(rest) => (true, rest),
            None => (false, reference.as_str()),
        };
        let id = ResourceLocation::parse(raw).map_err(serde::de::Error::custom)?;
        Ok(Self { id, tag, required })
    }
}

/// Contents of a tag JSON file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFile {
    /// Entries, in order.
    pub values: Vec<TagEntry>,
    /// Replace definitions of the same tag from lower priority packs instead
    /// of merging with them.
    #[serde(default, skip_serializing_if = "is_false")]
    pub replace: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl TagFile {
    /// A tag file with the given entries.
    pub fn new(values: Vec<TagEntry>, replace: bool) -> Self {
        Self { values, replace }
    }
}

/// Type-safe builder for a [`TagFile`] over registry `T`.
#[derive(Debug, Clone)]
pub struct TagBuilder<T> {
    entries: Vec<TagEntry>,
    replace: bool,
    _registry: PhantomData<fn() -> T>,
}

impl<T: RegistryType> Default for TagBuilder<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            replace: false,
            _registry: PhantomData,
        }
    }
}

impl<T: RegistryType> TagBuilder<T> {
    /// Empty builder with `replace = false`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of the `replace` field.
    pub fn replace(&self) -> bool {
        self.replace
    }

    /// Set the `replace` field.
    pub fn set_replace(&mut self, replace: bool) -> &mut Self {
        self.replace = replace;
        self
    }

    /// Add a raw entry.
    pub fn add_entry(&mut self, entry: TagEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    /// Add a required element by location.
    pub fn add_id(&mut self, id: ResourceLocation) -> &mut Self {
        self.add_entry(TagEntry::element(id))
    }

    /// Add a required element.
    pub fn add(&mut self, key: &ResourceKey<T>) -> &mut Self {
        self.add_id(key.location().clone())
    }

    /// Add an optional element by location.
    pub fn add_optional_id(&mut self, id: ResourceLocation) -> &mut Self {
        self.add_entry(TagEntry::optional_element(id))
    }

    /// Add an optional element.
    pub fn add_optional(&mut self, key: &ResourceKey<T>) -> &mut Self {
        self.add_optional_id(key.location().clone())
    }

    /// Add a required nested tag by location.
    pub fn add_tag_id(&mut self, id: ResourceLocation) -> &mut Self {
        self.add_entry(TagEntry::tag(id))
    }

    /// Add a required nested tag.
    pub fn add_tag(&mut self, tag: &TagKey<T>) -> &mut Self {
        self.add_tag_id(tag.location().clone())
    }

    /// Add an optional nested tag by location.
    pub fn add_optional_tag_id(&mut self, id: ResourceLocation) -> &mut Self {
        self.add_entry(TagEntry::optional_tag(id))
    }

    /// Add an optional nested tag.
    pub fn add_optional_tag(&mut self, tag: &TagKey<T>) -> &mut Self {
        self.add_optional_tag_id(tag.location().clone())
    }

    /// Finish the tag file.
    pub fn build(&self) -> TagFile {
        TagFile::new(self.entries.clone(), self.replace)
    }
}

/// Tag builder that accepts registry values directly, resolving each to its
/// key through `key_of`.
pub struct IntrinsicHolderTagBuilder<T, V> {
    inner: TagBuilder<T>,
    key_of: fn(&V) -> ResourceKey<T>,
}

impl<T: RegistryType, V> IntrinsicHolderTagBuilder<T, V> {
    /// Builder resolving values through `key_of`.
    pub fn new(key_of: fn(&V) -> ResourceKey<T>) -> Self {
        Self {
            inner: TagBuilder::new(),
            key_of,
        }
    }

    /// Add a required value.
    pub fn add_value(&mut self, value: &V) -> &mut Self {
        let key = (self.key_of)(value);
        self.inner.add(&key);
        self
    }

    /// Add an optional value.
    pub fn add_optional_value(&mut self, value: &V) -> &mut Self {
        let key = (self.key_of)(value);
        self.inner.add_optional(&key);
        self
    }

    /// The underlying key-based builder.
    pub fn keys(&mut self) -> &mut TagBuilder<T> {
        &mut self.inner
    }

    /// Finish the tag file.
    pub fn build(&self) -> TagFile {
        self.inner.build()
    }
}
