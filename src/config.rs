use anyhow::{Context, Result};
use packweave_core::{PackPosition, PackType};
use packweave_splice::VANILLA_PACK_ID;
use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A pack layout to inspect: the user's selection, where packs come from and
/// which producers are registered.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutConfig {
    /// Id of the vanilla pack the aggregate splice anchors on.
    #[serde(default = "default_vanilla")]
    pub vanilla: String,
    /// The user's configured order, lowest priority first.
    #[serde(default)]
    pub selected: Vec<String>,
    /// Repository sources, in discovery order.
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceConfig>,
    /// Registered producers, in registration order.
    #[serde(default, rename = "register")]
    pub registrations: Vec<RegistrationConfig>,
}

fn default_vanilla() -> String {
    VANILLA_PACK_ID.to_string()
}

/// One repository source.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// A directory whose subdirectories are packs with a `pack.mcmeta`.
    Folder {
        /// Directory to scan. Relative paths resolve against the layout file.
        path: PathBuf,
    },
    /// Runtime packs a mod adds to the repository directly.
    Virtual {
        /// Pack ids.
        packs: Vec<String>,
    },
}

/// One producer registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistrationConfig {
    /// Where the producer's packs go.
    pub position: PackPosition,
    /// Domain the producer serves; both when omitted.
    #[serde(default)]
    pub domain: Option<PackType>,
    /// Ids of the packs the producer yields, in order.
    #[serde(default)]
    pub packs: Vec<String>,
    /// Make the producer fail instead of yielding its packs.
    #[serde(default)]
    pub fail: bool,
}

impl RegistrationConfig {
    /// Domains the producer is registered for.
    pub fn domains(&self) -> Vec<PackType> {
        match self.domain {
            Some(domain) => vec![domain],
            None => PackType::ALL.to_vec(),
        }
    }
}

impl LayoutConfig {
    /// Load a layout file, resolving relative folder paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let layout = Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Ok(layout.resolve_paths(base))
    }

    /// Parse a layout from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// User-band registrations that never run because no folder source
    /// exists to splice them around.
    pub fn stranded_registrations(&self) -> Vec<&RegistrationConfig> {
        let has_folder = self
            .sources
            .iter()
            .any(|source| matches!(source, SourceConfig::Folder { .. }));
        if has_folder {
            return Vec::new();
        }
        self.registrations
            .iter()
            .filter(|registration| registration.position.is_user_band())
            .collect()
    }

    fn resolve_paths(mut self, base: &Path) -> Self {
        for source in &mut self.sources {
            if let SourceConfig::Folder { path } = source {
                if path.is_relative() {
                    *path = base.join(&*path);
                }
            }
        }
        self
    }
}
