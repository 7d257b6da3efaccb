//! Insertion positions for virtual packs.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pack::PackSelectionConfig;

/// Where a producer wants its packs to end up in the final pack list.
///
/// The list runs from lowest to highest priority: later packs override
/// resources of earlier ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackPosition {
    /// Below every other pack. Even vanilla overrides these.
    BeforeAll,
    /// Above every other pack. These override everything.
    AfterAll,
    /// Directly below the vanilla pack.
    BeforeVanilla,
    /// Directly above the vanilla pack, below user packs.
    AfterVanilla,
    /// Together with the user packs of a folder source, below them.
    ///
    /// Packs registered here are visible to users and can be disabled.
    BeforeUser,
    /// Together with the user packs of a folder source, above them.
    ///
    /// Packs registered here are visible to users and can be disabled.
    AfterUser,
}

impl PackPosition {
    /// Every position, in declaration order.
    pub const ALL: [PackPosition; 6] = [
        PackPosition::BeforeAll,
        PackPosition::AfterAll,
        PackPosition::BeforeVanilla,
        PackPosition::AfterVanilla,
        PackPosition::BeforeUser,
        PackPosition::AfterUser,
    ];

    /// Whether this position is spliced per repository source rather than
    /// into the aggregate list.
    pub fn is_user_band(self) -> bool {
        matches!(self, PackPosition::BeforeUser | PackPosition::AfterUser)
    }
}

impl fmt::Display for PackPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PackPosition::BeforeAll => "BEFORE_ALL",
            PackPosition::AfterAll => "AFTER_ALL",
            PackPosition::BeforeVanilla => "BEFORE_VANILLA",
            PackPosition::AfterVanilla => "AFTER_VANILLA",
            PackPosition::BeforeUser => "BEFORE_USER",
            PackPosition::AfterUser => "AFTER_USER",
        };
        f.write_str(name)
    }
}

/// Whether a pack lands at the top (highest priority) or bottom (lowest
/// priority) of the batch it is inserted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideDirection {
    /// Highest priority among the batch.
    Top,
    /// Lowest priority among the batch.
    Bottom,
}

impl OverrideDirection {
    /// Insert `element` into an ordered selection, returning its index.
    ///
    /// `Bottom` goes after the leading run of entries pinned to the bottom,
    /// `Top` before the trailing run of entries pinned to the top. Repeated
    /// `Bottom` insertions therefore end up in reverse insertion order.
    pub fn insert<T, F>(self, list: &mut Vec<T>, element: T, config_of: F) -> usize
    where
        F: Fn(&T) -> &PackSelectionConfig,
    {
        let pinned = |item: &T| {
            let config = config_of(item);
            config.fixed_position && config.default_position == self
        };
        let index = match self {
            OverrideDirection::Bottom => list
                .iter()
                .position(|item| !pinned(item))
                .unwrap_or(list.len()),
            OverrideDirection::Top => list
                .iter()
                .rposition(|item| !pinned(item))
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        list.insert(index, element);
        index
    }
}
