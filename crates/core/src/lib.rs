#![warn(missing_docs)]
//! Core pack primitives shared across the workspace.

pub mod domain;
pub mod location;
pub mod pack;
pub mod position;
pub mod repository;

// Re-export commonly used types
pub use domain::PackType;
pub use location::{ResourceLocation, ResourceLocationError, DEFAULT_NAMESPACE};
pub use pack::{
    KnownPack, Pack, PackLocationInfo, PackMetadata, PackRef, PackResources,
    PackSelectionConfig, PackSource, Resource, PACK_SECTION,
};
pub use position::{OverrideDirection, PackPosition};
pub use repository::RepositorySource;
