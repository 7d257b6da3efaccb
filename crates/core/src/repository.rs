//! The host's view of where packs come from.

use crate::Pack;

/// A place packs are discovered from: a folder of user packs, the built-in
/// packs, a server download.
///
/// Sources push every pack they find into `consumer`, in discovery order.
pub trait RepositorySource {
    /// Discover packs, handing each one to `consumer`.
    fn load_packs(&mut self, consumer: &mut dyn FnMut(Pack));
}
