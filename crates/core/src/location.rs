//! Namespaced resource locations.
//!
//! Resource locations are the `namespace:path` identifiers the game uses for
//! packs, registry entries, tags and files inside a pack (e.g.
//! `minecraft:diamond`). They are ordered and validated so that iteration over
//! pack contents is deterministic.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Namespace used when a location omits an explicit namespace.
pub const DEFAULT_NAMESPACE: &str = "minecraft";

/// Error returned when parsing an invalid [`ResourceLocation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceLocationError {
    message: String,
}

impl ResourceLocationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ResourceLocationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ResourceLocationError {}

/// A namespaced location of the form `namespace:path`.
///
/// Ordering is lexical by `(namespace, path)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceLocation {
    namespace: String,
    path: String,
}

impl ResourceLocation {
    /// Parse a location.
    ///
    /// Accepts either:
    /// - `namespace:path`
    /// - `path` (uses [`DEFAULT_NAMESPACE`])
    pub fn parse(input: &str) -> Result<Self, ResourceLocationError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ResourceLocationError::new(
                "ResourceLocation cannot be empty",
            ));
        }

        let (namespace, path) = match input.split_once(':') {
            Some((ns, p)) => (ns, p),
            None => (DEFAULT_NAMESPACE, input),
        };
        Self::new(namespace, path)
    }

    /// Build a location from its two halves, validating both.
    pub fn new(namespace: &str, path: &str) -> Result<Self, ResourceLocationError> {
        validate_namespace(namespace)?;
        validate_path(path)?;
        Ok(Self {
            namespace: namespace.to_string(),
            path: path.to_string(),
        })
    }

    /// Like [`ResourceLocation::new`], but discards the reason on failure.
    pub fn try_build(namespace: &str, path: &str) -> Option<Self> {
        Self::new(namespace, path).ok()
    }

    /// Shorthand for a location in the [`DEFAULT_NAMESPACE`].
    pub fn vanilla(path: &str) -> Result<Self, ResourceLocationError> {
        Self::new(DEFAULT_NAMESPACE, path)
    }

    /// Location namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Location path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path split on `/`.
    pub fn path_segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/')
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

impl FromStr for ResourceLocation {
    type Err = ResourceLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceLocation {
    type Error = ResourceLocationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ResourceLocation> for String {
    fn from(value: ResourceLocation) -> Self {
        value.to_string()
    }
}

fn validate_namespace(ns: &str) -> Result<(), ResourceLocationError> {
    if ns.is_empty() {
        return Err(ResourceLocationError::new(
            "ResourceLocation namespace cannot be empty",
        ));
    }
    if !ns
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.'))
    {
        return Err(ResourceLocationError::new(format!(
            "ResourceLocation namespace '{ns}' has invalid characters (allowed: a-z0-9_.-)"
        )));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<(), ResourceLocationError> {
    if path.is_empty() {
        return Err(ResourceLocationError::new(
            "ResourceLocation path cannot be empty",
        ));
    }
    if !path
        .chars()
        .all(|c| matches!(c, 'a'..='z' | '0'..='9' | '_' | '-' | '.' | '/'))
    {
        return Err(ResourceLocationError::new(format!(
            "ResourceLocation path '{path}' has invalid characters (allowed: a-z0-9_./-)"
        )));
    }
    Ok(())
}
