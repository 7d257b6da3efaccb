//! Resource domains: which half of the game a pack feeds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Pack format of client resource packs for the supported game version.
pub const CLIENT_RESOURCES_PACK_FORMAT: u32 = 46;

/// Pack format of server data packs for the supported game version.
pub const SERVER_DATA_PACK_FORMAT: u32 = 61;

/// The resource domain a pack or registration applies to.
///
/// Registrations are keyed by domain, so a producer registered for
/// [`PackType::ServerData`] never runs while client resources reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PackType {
    /// Client assets (textures, models, sounds, languages).
    #[serde(rename = "assets", alias = "client_resources")]
    ClientResources,
    /// Server data (recipes, tags, advancements, loot tables).
    #[serde(rename = "data", alias = "server_data")]
    ServerData,
}

impl PackType {
    /// Every domain, in a fixed order.
    pub const ALL: [PackType; 2] = [PackType::ClientResources, PackType::ServerData];

    /// Top-level directory inside a pack holding this domain's files.
    pub fn directory(self) -> &'static str {
        match self {
            PackType::ClientResources => "assets",
            PackType::ServerData => "data",
        }
    }

    /// Pack format number packs generated at runtime should advertise.
    pub fn current_pack_format(self) -> u32 {
        match self {
            PackType::ClientResources => CLIENT_RESOURCES_PACK_FORMAT,
            PackType::ServerData => SERVER_DATA_PACK_FORMAT,
        }
    }

    /// Parse a domain from its directory name or its long name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "assets" | "client_resources" | "client" => Some(PackType::ClientResources),
            "data" | "server_data" | "server" => Some(PackType::ServerData),
            _ => None,
        }
    }
}

impl fmt::Display for PackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackType::ClientResources => write!(f, "CLIENT_RESOURCES"),
            PackType::ServerData => write!(f, "SERVER_DATA"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_match_pack_layout() {
        assert_eq!(PackType::ClientResources.directory(), "assets");
        assert_eq!(PackType::ServerData.directory(), "data");
    }

    #[test]
    fn parse_accepts_both_spellings() {
        assert_eq!(PackType::parse("data"), Some(PackType::ServerData));
        assert_eq!(PackType::parse("SERVER_DATA"), Some(PackType::ServerData));
        assert_eq!(PackType::parse("assets"), Some(PackType::ClientResources));
        assert_eq!(PackType::parse("textures"), None);
    }
}
