#![warn(missing_docs)]
//! Runtime pack construction: in-memory packs, typed tags and placeholder
//! holder sets for data generated before the registries exist.

mod entries;
mod holder_set;
mod registries;
mod runtime_pack;
mod tags;

pub use holder_set::{DummyHolderGetter, HolderSet};
pub use registries::{
    Advancement, Block, Enchantment, EntityType, Fluid, Item, Recipe, RegistryType, ResourceKey,
    TagKey,
};
pub use runtime_pack::{
    RuntimeResourcePack, FEATURES_SECTION, FILTER_SECTION, OVERLAYS_SECTION,
};
pub use tags::{IntrinsicHolderTagBuilder, TagBuilder, TagEntry, TagFile};

use packweave_core::ResourceLocationError;
use thiserror::Error;

/// Errors emitted while building a runtime pack.
#[derive(Debug, Error)]
pub enum PackError {
    /// A path runs through an existing file.
    #[error("path '{path}' passes through an existing resource")]
    PathConflict {
        /// Offending path, `/`-separated.
        path: String,
    },
    /// A resource was added with no path.
    #[error("resource path is empty")]
    EmptyPath,
    /// A value could not be encoded as JSON.
    #[error("failed to serialize resource '{path}': {source}")]
    Serialize {
        /// Target location.
        path: String,
        /// Underlying encoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A generated location is not valid.
    #[error("invalid resource location: {0}")]
    Location(#[from] ResourceLocationError),
    /// The lookup needs a live registry.
    #[error("lookup of {0} is not supported without a registry")]
    UnsupportedLookup(String),
}
