#![warn(missing_docs)]
//! Pack ordering engine: the callback registry plus the two splice sites that
//! insert runtime packs into the host's pack lists.

mod aggregate;
mod error;
pub mod global;
mod registry;
mod user;

pub use aggregate::{assemble_pack_list, VanillaAnchor, VANILLA_PACK_ID};
pub use error::SpliceError;
pub use registry::{CallbackRegistry, DispatchStats, PackAdder, PackCallbacks};
pub use user::{InjectingSource, UserPackSplice};
