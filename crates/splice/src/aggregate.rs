//! Aggregate-list splice: inserts the vanilla-relative and whole-list
//! positions into the final pack list handed to the resource manager.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use packweave_core::{PackPosition, PackRef, PackType};
use tracing::{debug, warn};

use crate::{PackCallbacks, SpliceError};

/// Id of the built-in baseline pack.
pub const VANILLA_PACK_ID: &str = "vanilla";

/// How to find the vanilla pack in the base list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VanillaAnchor {
    /// Vanilla sits at this index of the base list.
    Index(usize),
    /// Vanilla is the first pack with this id.
    Id(String),
}

impl Default for VanillaAnchor {
    fn default() -> Self {
        VanillaAnchor::Id(VANILLA_PACK_ID.to_string())
    }
}

impl fmt::Display for VanillaAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VanillaAnchor::Index(index) => write!(f, "at index {index}"),
            VanillaAnchor::Id(id) => write!(f, "'{id}'"),
        }
    }
}

impl VanillaAnchor {
    /// Index of vanilla in `packs`.
    pub fn locate(&self, packs: &[PackRef], domain: PackType) -> Result<usize, SpliceError> {
        let found = match self {
            VanillaAnchor::Index(index) => (*index < packs.len()).then_some(*index),
            VanillaAnchor::Id(id) => packs.iter().position(|pack| pack.pack_id() == id),
        };
        found.ok_or_else(|| SpliceError::MissingVanillaAnchor {
            anchor: self.to_string(),
            domain,
            len: packs.len(),
        })
    }
}

/// Build the final pack list for `domain` from the host's base list.
///
/// The base list runs from lowest to highest priority and must contain the
/// vanilla pack. Producers are dispatched in the order `BEFORE_ALL`,
/// `BEFORE_VANILLA`, `AFTER_VANILLA`, `AFTER_ALL`:
///
/// - `BEFORE_ALL` packs form a block at the very front, in dispatch order.
/// - `BEFORE_VANILLA` packs are collected, reversed and inserted right below
///   vanilla, so the first producer ends up adjacent to vanilla.
/// - `AFTER_VANILLA` packs are inserted right above vanilla in dispatch order.
/// - `AFTER_ALL` packs are appended in dispatch order.
///
/// The anchor is resolved before any producer runs.
pub fn assemble_pack_list(
    callbacks: &PackCallbacks,
    domain: PackType,
    base: &[PackRef],
    anchor: &VanillaAnchor,
) -> Result<Vec<PackRef>, SpliceError> {
    let mut vanilla = anchor.locate(base, domain)?;

    let mut packs = callbacks.collect(PackPosition::BeforeAll, domain);
    vanilla += packs.len();
    packs.extend(base.iter().cloned());

    let mut below = callbacks.collect(PackPosition::BeforeVanilla, domain);
    below.reverse();
    let inserted = below.len();
    packs.splice(vanilla..vanilla, below);
    vanilla += inserted;

    let above = callbacks.collect(PackPosition::AfterVanilla, domain);
    packs.splice(vanilla + 1..vanilla + 1, above);

    callbacks.dispatch(PackPosition::AfterAll, domain, &mut |pack| packs.push(pack));

    warn_on_duplicates(&packs);
    log_pack_list(&packs);
    Ok(packs)
}

fn warn_on_duplicates(packs: &[PackRef]) {
    let mut seen = HashSet::with_capacity(packs.len());
    for pack in packs {
        if !seen.insert(Arc::as_ptr(pack) as *const ()) {
            warn!(
                "pack '{}' appears more than once in the final pack list",
                pack.pack_id()
            );
        }
    }
}

fn log_pack_list(packs: &[PackRef]) {
    let listing: String = packs
        .iter()
        .map(|pack| format!("\n- {}", pack.pack_id()))
        .collect();
    debug!("Full list of packs is now:{listing}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CallbackRegistry;
    use packweave_testkit::{ids, stub, stubs};

    const DATA: PackType = PackType::ServerData;

    #[test]
    fn vanilla_relative_positions_are_asymmetric() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::BeforeVanilla, DATA, vec![stub("p1")])
            .register_packs(PackPosition::BeforeVanilla, DATA, vec![stub("p2")])
            .register_packs(PackPosition::AfterVanilla, DATA, vec![stub("q1")])
            .register_packs(PackPosition::AfterVanilla, DATA, vec![stub("q2")]);
        let callbacks = registry.seal();

        let base = stubs(&["low", "vanilla", "user"]);
        let packs = assemble_pack_list(&callbacks, DATA, &base, &VanillaAnchor::default()).unwrap();
        assert_eq!(
            ids(&packs),
            vec!["low", "p2", "p1", "vanilla", "q1", "q2", "user"]
        );
    }

    #[test]
    fn index_anchor_accounts_for_front_insertions() {
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::BeforeAll, DATA, stubs(&["x1", "x2"]))
            .register_packs(PackPosition::AfterVanilla, DATA, vec![stub("y")]);
        let callbacks = registry.seal();

        let base = stubs(&["vanilla", "user"]);
        let packs = assemble_pack_list(&callbacks, DATA, &base, &VanillaAnchor::Index(0)).unwrap();
        assert_eq!(ids(&packs), vec!["x1", "x2", "vanilla", "y", "user"]);
    }

    #[test]
    fn missing_anchor_fails_before_dispatch() {
        let mut registry = CallbackRegistry::new();
        registry.register(PackPosition::BeforeAll, DATA, |_| {
            panic!("must not be dispatched without an anchor")
        });
        let callbacks = registry.seal();

        let base = stubs(&["user_a", "user_b"]);
        let err = assemble_pack_list(&callbacks, DATA, &base, &VanillaAnchor::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SpliceError::MissingVanillaAnchor { len: 2, .. }
        ));
        assert!(
            assemble_pack_list(&callbacks, DATA, &base, &VanillaAnchor::Index(2)).is_err()
        );
    }

    #[test]
    fn no_producers_leave_base_untouched() {
        let base = stubs(&["vanilla", "a", "b"]);
        let packs =
            assemble_pack_list(&PackCallbacks::empty(), DATA, &base, &VanillaAnchor::default())
                .unwrap();
        assert_eq!(ids(&packs), ids(&base));
        assert!(packs
            .iter()
            .zip(&base)
            .all(|(out, input)| Arc::ptr_eq(out, input)));
    }

    #[test]
    fn duplicate_handles_are_kept() {
        let shared = stub("shared");
        let mut registry = CallbackRegistry::new();
        registry
            .register_packs(PackPosition::BeforeAll, DATA, vec![shared.clone()])
            .register_packs(PackPosition::AfterAll, DATA, vec![shared]);
        let callbacks = registry.seal();

        let packs = assemble_pack_list(
            &callbacks,
            DATA,
            &stubs(&["vanilla"]),
            &VanillaAnchor::default(),
        )
        .unwrap();
        assert_eq!(ids(&packs), vec!["shared", "vanilla", "shared"]);
    }
}
