use thiserror::Error;

use packweave_core::PackType;

/// Errors surfaced by the ordering engine.
#[derive(Debug, Error)]
pub enum SpliceError {
    /// The vanilla pack could not be located in the base list.
    #[error("vanilla anchor {anchor} not found among {len} {domain} packs")]
    MissingVanillaAnchor {
        /// Human-readable form of the anchor that was searched for.
        anchor: String,
        /// Domain being assembled.
        domain: PackType,
        /// Length of the base list.
        len: usize,
    },
    /// A callback table was already installed for this process.
    #[error("pack callbacks are already installed for this process")]
    AlreadyInstalled,
}
