//! User-pack splice: runs `BEFORE_USER` and `AFTER_USER` producers around the
//! packs a single repository source discovers.

use std::sync::Arc;

use packweave_core::{OverrideDirection, Pack, PackPosition, PackType, RepositorySource};

use crate::PackCallbacks;

/// Wraps a repository consumer so virtual packs surround the real ones.
///
/// `BEFORE_USER` packs (direction `Bottom`) are forwarded before the first
/// real pack, `AFTER_USER` packs (direction `Top`) by [`finish`]. A source
/// that discovers nothing still gets both batches once `finish` runs.
///
/// [`finish`]: UserPackSplice::finish
pub struct UserPackSplice<'a, S>
where
    S: FnMut(Pack),
{
    callbacks: &'a PackCallbacks,
    domain: PackType,
    sink: S,
    before_drained: bool,
}

impl<'a, S> UserPackSplice<'a, S>
where
    S: FnMut(Pack),
{
    /// Wrap `sink` for packs of `domain`.
    pub fn new(callbacks: &'a PackCallbacks, domain: PackType, sink: S) -> Self {
        Self {
            callbacks,
            domain,
            sink,
            before_drained: false,
        }
    }

    /// Forward one discovered pack.
    pub fn accept(&mut self, pack: Pack) {
        self.drain_before();
        (self.sink)(pack);
    }

    /// Forward the `AFTER_USER` batch and hand back the wrapped sink.
    pub fn finish(mut self) -> S {
        self.drain_before();
        self.drain(PackPosition::AfterUser, OverrideDirection::Top);
        self.sink
    }

    fn drain_before(&mut self) {
        if !self.before_drained {
            self.before_drained = true;
            self.drain(PackPosition::BeforeUser, OverrideDirection::Bottom);
        }
    }

    fn drain(&mut self, position: PackPosition, direction: OverrideDirection) {
        let domain = self.domain;
        let sink = &mut self.sink;
        self.callbacks.dispatch(position, domain, &mut |resources| {
            if let Some(pack) = Pack::from_resources(resources, domain, direction) {
                sink(pack);
            }
        });
    }
}

/// A repository source whose loads go through a [`UserPackSplice`].
#[derive(Debug)]
pub struct InjectingSource<S> {
    inner: S,
    domain: PackType,
    callbacks: Arc<PackCallbacks>,
}

impl<S> InjectingSource<S> {
    /// Decorate `inner`, a source of user packs for `domain`.
    pub fn new(inner: S, domain: PackType, callbacks: Arc<PackCallbacks>) -> Self {
        Self {
            inner,
            domain,
            callbacks,
        }
    }

    /// The decorated source.
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S: RepositorySource> RepositorySource for InjectingSource<S> {
    fn load_packs(&mut self, consumer: &mut dyn FnMut(Pack)) {
        let mut splice = UserPackSplice::new(&self.callbacks, self.domain, consumer);
        self.inner.load_packs(&mut |pack| splice.accept(pack));
        splice.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallbackRegistry;
    use packweave_testkit::{pack_ids, stub, user_pack, FixedSource, StubPack};

    const DATA: PackType = PackType::ServerData;

    fn user_band_callbacks() -> Arc<PackCallbacks> {
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::BeforeUser, DATA, vec![stub("b")])
            .register_packs(PackPosition::AfterUser, DATA, vec![stub("t")]);
        Arc::new(registry.seal())
    }

    #[test]
    fn virtual_packs_surround_discovered_packs() {
        let callbacks = user_band_callbacks();
        let mut forwarded = Vec::new();
        let mut splice = UserPackSplice::new(&callbacks, DATA, |pack| forwarded.push(pack));
        splice.accept(user_pack("p1"));
        splice.accept(user_pack("p2"));
        splice.finish();

        assert_eq!(pack_ids(&forwarded), vec!["b", "p1", "p2", "t"]);
        assert_eq!(forwarded[0].default_position(), OverrideDirection::Bottom);
        assert_eq!(forwarded[3].default_position(), OverrideDirection::Top);
    }

    #[test]
    fn empty_source_still_gets_both_batches() {
        let callbacks = user_band_callbacks();
        let forwarded = {
            let mut out = Vec::new();
            UserPackSplice::new(&callbacks, DATA, |pack| out.push(pack)).finish();
            out
        };
        assert_eq!(pack_ids(&forwarded), vec!["b", "t"]);
    }

    #[test]
    fn injecting_source_wraps_every_load() {
        let source = FixedSource::new(vec![user_pack("p1"), user_pack("p2")]);
        let mut injecting = InjectingSource::new(source, DATA, user_band_callbacks());

        for _ in 0..2 {
            let mut forwarded = Vec::new();
            injecting.load_packs(&mut |pack| forwarded.push(pack));
            assert_eq!(pack_ids(&forwarded), vec!["b", "p1", "p2", "t"]);
        }
        assert_eq!(injecting.inner().loads, 2);
    }

    #[test]
    fn packs_without_metadata_are_dropped() {
        let mut registry = CallbackRegistry::new();
        registry.register_packs(
            PackPosition::AfterUser,
            DATA,
            vec![StubPack::new("broken").without_metadata().into_ref(), stub("ok")],
        );
        let callbacks = registry.seal();

        let mut forwarded = Vec::new();
        UserPackSplice::new(&callbacks, DATA, |pack| forwarded.push(pack)).finish();
        assert_eq!(pack_ids(&forwarded), vec!["ok"]);
    }

    #[test]
    fn other_domains_are_not_dispatched() {
        let callbacks = user_band_callbacks();
        let mut forwarded = Vec::new();
        let mut splice =
            UserPackSplice::new(&callbacks, PackType::ClientResources, |pack| forwarded.push(pack));
        splice.accept(user_pack("p1"));
        splice.finish();
        assert_eq!(pack_ids(&forwarded), vec!["p1"]);
    }
}
