//! Position registry and callback dispatcher.
//!
//! Producers register during a single setup phase on a [`CallbackRegistry`].
//! Sealing it yields an immutable [`PackCallbacks`] table that the ordering
//! engine dispatches on every reload. A producer that fails (by returning an
//! error or panicking) contributes nothing for that dispatch and does not stop
//! the producers registered after it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use packweave_core::{PackPosition, PackRef, PackType};
use tracing::{debug, error, warn};

type CallbackKey = (PackPosition, PackType);
type PackCallback = Box<dyn Fn(&mut PackAdder<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Write-only sink handed to producers.
pub struct PackAdder<'a> {
    staged: &'a mut Vec<PackRef>,
}

impl<'a> PackAdder<'a> {
    fn new(staged: &'a mut Vec<PackRef>) -> Self {
        Self { staged }
    }

    /// Add one pack.
    pub fn add(&mut self, pack: PackRef) {
        debug!(
            "adding pack '{}' with known pack info: {:?}",
            pack.pack_id(),
            pack.known_pack_info()
        );
        self.staged.push(pack);
    }

    /// Add several packs, in iteration order.
    pub fn add_all<I>(&mut self, packs: I)
    where
        I: IntoIterator<Item = PackRef>,
    {
        for pack in packs {
            self.add(pack);
        }
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    /// Callbacks invoked.
    pub callbacks: usize,
    /// Callbacks that returned an error or panicked.
    pub failed: usize,
    /// Packs forwarded to the sink.
    pub packs: usize,
}

/// Registration phase of the callback table.
#[derive(Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackKey, Vec<PackCallback>>,
}

impl CallbackRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a producer for `(position, domain)`.
    ///
    /// Producers under the same key run in registration order. Registering
    /// the same producer twice runs it twice.
    pub fn register<F>(&mut self, position: PackPosition, domain: PackType, callback: F) -> &mut Self
    where
        F: Fn(&mut PackAdder<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks
            .entry((position, domain))
            .or_default()
            .push(Box::new(callback));
        self
    }

    /// Register a producer that always yields the same packs.
    pub fn register_packs(
        &mut self,
        position: PackPosition,
        domain: PackType,
        packs: Vec<PackRef>,
    ) -> &mut Self {
        self.register(position, domain, move |adder| {
            adder.add_all(packs.iter().cloned());
            Ok(())
        })
    }

    /// Close the registration window.
    pub fn seal(self) -> PackCallbacks {
        PackCallbacks {
            callbacks: self.callbacks,
        }
    }
}

impl fmt::Debug for CallbackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackRegistry")
            .field("keys", &self.callbacks.len())
            .finish()
    }
}

/// Sealed, read-only callback table.
pub struct PackCallbacks {
    callbacks: HashMap<CallbackKey, Vec<PackCallback>>,
}

impl PackCallbacks {
    /// A table with no producers.
    pub fn empty() -> Self {
        CallbackRegistry::new().seal()
    }

    /// Number of producers registered for `(position, domain)`.
    pub fn callback_count(&self, position: PackPosition, domain: PackType) -> usize {
        self.callbacks
            .get(&(position, domain))
            .map_or(0, Vec::len)
    }

    /// Run every producer for `(position, domain)`, forwarding their packs to
    /// `sink` in registration order.
    pub fn dispatch(
        &self,
        position: PackPosition,
        domain: PackType,
        sink: &mut dyn FnMut(PackRef),
    ) -> DispatchStats {
        debug!("Registering {position} packs with type {domain}");
        let mut stats = DispatchStats::default();
        let Some(callbacks) = self.callbacks.get(&(position, domain)) else {
            return stats;
        };

        for (index, callback) in callbacks.iter().enumerate() {
            stats.callbacks += 1;
            let mut staged = Vec::new();
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                callback(&mut PackAdder::new(&mut staged))
            }));
            match outcome {
                Ok(Ok(())) => {
                    stats.packs += staged.len();
                    staged.into_iter().for_each(&mut *sink);
                }
                Ok(Err(err)) => {
                    stats.failed += 1;
                    warn!("{position} producer #{index} for {domain} failed: {err:#}");
                }
                Err(payload) => {
                    stats.failed += 1;
                    error!(
                        "{position} producer #{index} for {domain} panicked: {}",
                        panic_message(payload.as_ref())
                    );
                }
            }
        }
        stats
    }

    /// Run every producer for `(position, domain)` into a fresh list.
    pub fn collect(&self, position: PackPosition, domain: PackType) -> Vec<PackRef> {
        let mut packs = Vec::new();
        self.dispatch(position, domain, &mut |pack| packs.push(pack));
        packs
    }
}

impl fmt::Debug for PackCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackCallbacks")
            .field("keys", &self.callbacks.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use packweave_testkit::{ids, stub};

    #[test]
    fn dispatch_runs_in_registration_order() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::AfterAll, PackType::ServerData, vec![stub("a")])
            .register(PackPosition::AfterAll, PackType::ServerData, |adder| {
                adder.add(stub("b"));
                adder.add(stub("c"));
                Ok(())
            });
        let callbacks = registry.seal();

        let packs = callbacks.collect(PackPosition::AfterAll, PackType::ServerData);
        assert_eq!(ids(&packs), vec!["a", "b", "c"]);
        assert_eq!(
            callbacks.callback_count(PackPosition::AfterAll, PackType::ServerData),
            2
        );
    }

    #[test]
    fn domains_and_positions_are_isolated() {
        let mut registry = CallbackRegistry::new();
        registry.register_packs(
            PackPosition::AfterAll,
            PackType::ClientResources,
            vec![stub("client")],
        );
        let callbacks = registry.seal();

        assert!(callbacks
            .collect(PackPosition::AfterAll, PackType::ServerData)
            .is_empty());
        assert!(callbacks
            .collect(PackPosition::BeforeAll, PackType::ClientResources)
            .is_empty());
        assert_eq!(
            ids(&callbacks.collect(PackPosition::AfterAll, PackType::ClientResources)),
            vec!["client"]
        );
    }

    #[test]
    fn failing_producers_contribute_nothing() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::BeforeAll, PackType::ServerData, vec![stub("first")])
            .register(PackPosition::BeforeAll, PackType::ServerData, |adder| {
                adder.add(stub("half_done"));
                bail!("producer gave up")
            })
            .register(PackPosition::BeforeAll, PackType::ServerData, |adder| {
                adder.add(stub("before_panic"));
                panic!("producer exploded")
            })
            .register_packs(PackPosition::BeforeAll, PackType::ServerData, vec![stub("last")]);
        let callbacks = registry.seal();

        let mut packs = Vec::new();
        let stats = callbacks.dispatch(
            PackPosition::BeforeAll,
            PackType::ServerData,
            &mut |pack| packs.push(pack),
        );
        assert_eq!(ids(&packs), vec!["first", "last"]);
        assert_eq!(
            stats,
            DispatchStats {
                callbacks: 4,
                failed: 2,
                packs: 2
            }
        );
    }

    #[test]
    fn same_producer_registered_twice_runs_twice() {
        let mut registry = CallbackRegistry::new();
        let pack = stub("dup");
        registry
            .register_packs(PackPosition::AfterUser, PackType::ServerData, vec![pack.clone()])
            .register_packs(PackPosition::AfterUser, PackType::ServerData, vec![pack]);
        let callbacks = registry.seal();
        assert_eq!(
            callbacks
                .collect(PackPosition::AfterUser, PackType::ServerData)
                .len(),
            2
        );
    }

    #[test]
    fn empty_table_dispatches_nothing() {
        let stats = PackCallbacks::empty().dispatch(
            PackPosition::AfterVanilla,
            PackType::ServerData,
            &mut |_| panic!("no producers registered"),
        );
        assert_eq!(stats, DispatchStats::default());
    }
}
