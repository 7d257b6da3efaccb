//! Typed registry markers and the keys that point into them.
//!
//! A marker type names a game registry; keys and tags carry the marker so an
//! item tag cannot accidentally receive a block.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use packweave_core::{ResourceLocation, DEFAULT_NAMESPACE};

/// A game registry, named by its location (`item`, `mymod:widget`).
pub trait RegistryType {
    /// Registry location; a bare path means the `minecraft` namespace.
    const REGISTRY: &'static str;

    /// Directory (relative to a namespace) holding the registry's elements.
    fn elements_dir() -> Vec<String> {
        registry_dir(Self::REGISTRY)
    }

    /// Directory (relative to a namespace) holding the registry's tags.
    fn tags_dir() -> Vec<String> {
        let mut dir = vec!["tags".to_string()];
        dir.extend(registry_dir(Self::REGISTRY));
        dir
    }
}

fn registry_dir(registry: &str) -> Vec<String> {
    let (namespace, path) = registry
        .split_once(':')
        .unwrap_or((DEFAULT_NAMESPACE, registry));
    let mut dir = Vec::new();
    if namespace != DEFAULT_NAMESPACE {
        dir.push(namespace.to_string());
    }
    dir.extend(path.split('/').map(str::to_string));
    dir
}

macro_rules! registry_marker {
    ($($(#[$meta:meta])* $name:ident => $registry:literal),* $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            pub enum $name {}

            impl RegistryType for $name {
                const REGISTRY: &'static str = $registry;
            }
        )*
    };
}

registry_marker! {
    /// Items.
    Item => "item",
    /// Blocks.
    Block => "block",
    /// Fluids.
    Fluid => "fluid",
    /// Entity types.
    EntityType => "entity_type",
    /// Enchantments.
    Enchantment => "enchantment",
    /// Recipes.
    Recipe => "recipe",
    /// Advancements.
    Advancement => "advancement",
}

/// Key of one element in registry `T`.
pub struct ResourceKey<T> {
    location: ResourceLocation,
    _registry: PhantomData<fn() -> T>,
}

impl<T: RegistryType> ResourceKey<T> {
    /// Key for `location` in registry `T`.
    pub fn new(location: ResourceLocation) -> Self {
        Self {
            location,
            _registry: PhantomData,
        }
    }

    /// Element location.
    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }
}

impl<T: RegistryType> fmt::Debug for ResourceKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey[{} / {}]", T::REGISTRY, self.location)
    }
}

/// A tag over registry `T`.
pub struct TagKey<T> {
    location: ResourceLocation,
    _registry: PhantomData<fn() -> T>,
}

impl<T: RegistryType> TagKey<T> {
    /// Tag `location` over registry `T`.
    pub fn new(location: ResourceLocation) -> Self {
        Self {
            location,
            _registry: PhantomData,
        }
    }

    /// Tag location.
    pub fn location(&self) -> &ResourceLocation {
        &self.location
    }
}

impl<T: RegistryType> fmt::Debug for TagKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TagKey[{} / {}]", T::REGISTRY, self.location)
    }
}

// Hand-written so `T` needs no bounds.
macro_rules! location_key_impls {
    ($($key:ident),*) => {
        $(
            impl<T> Clone for $key<T> {
                fn clone(&self) -> Self {
                    Self {
                        location: self.location.clone(),
                        _registry: PhantomData,
                    }
                }
            }

            impl<T> PartialEq for $key<T> {
                fn eq(&self, other: &Self) -> bool {
                    self.location == other.location
                }
            }

            impl<T> Eq for $key<T> {}

            impl<T> Hash for $key<T> {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.location.hash(state);
                }
            }
        )*
    };
}

location_key_impls!(ResourceKey, TagKey);

impl<T> fmt::Display for TagKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.location)
    }
}
