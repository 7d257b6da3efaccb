use anyhow::{Context, Result};
use packweave_core::{
    OverrideDirection, Pack, PackLocationInfo, PackResources, PackSelectionConfig, PackSource,
    PackType, RepositorySource, Resource, ResourceLocation,
};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, error, warn};
use walkdir::WalkDir;

/// Metadata file every pack directory carries.
pub const PACK_MCMETA_FILE: &str = "pack.mcmeta";

/// A pack stored as a directory on disk.
#[derive(Debug)]
pub struct FolderPack {
    info: PackLocationInfo,
    root: PathBuf,
    mcmeta: Value,
}

impl FolderPack {
    /// Open the pack at `root`, reading its `pack.mcmeta`.
    pub fn open(root: &Path) -> Result<Self> {
        let id = root
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        let mcmeta_path = root.join(PACK_MCMETA_FILE);
        let contents = fs::read_to_string(&mcmeta_path)
            .with_context(|| format!("Failed to read {}", mcmeta_path.display()))?;
        let mcmeta: Value = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", mcmeta_path.display()))?;
        Ok(Self {
            info: PackLocationInfo {
                title: id.clone(),
                id,
                source: PackSource::Default,
                known_pack: None,
            },
            root: root.to_path_buf(),
            mcmeta,
        })
    }

    fn namespace_dir(&self, domain: PackType, namespace: &str) -> Option<PathBuf> {
        join_segments(self.root.join(domain.directory()), [namespace])
    }

    fn read(&self, path: &Path) -> Option<Resource> {
        match fs::read(path) {
            Ok(bytes) => Some(bytes.into()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => None,
            Err(err) => {
                warn!("Failed to read {}: {err}", path.display());
                None
            }
        }
    }
}

impl PackResources for FolderPack {
    fn location(&self) -> &PackLocationInfo {
        &self.info
    }

    fn metadata_section(&self, name: &str) -> Option<Value> {
        self.mcmeta.get(name).cloned()
    }

    fn root_resource(&self, segments: &[&str]) -> Option<Resource> {
        let path = join_segments(self.root.clone(), segments.iter().copied())?;
        self.read(&path)
    }

    fn get_resource(&self, domain: PackType, location: &ResourceLocation) -> Option<Resource> {
        let namespace_dir = self.namespace_dir(domain, location.namespace())?;
        let path = join_segments(namespace_dir, location.path_segments())?;
        self.read(&path)
    }

    fn list_resources(
        &self,
        domain: PackType,
        namespace: &str,
        prefix: &str,
        out: &mut dyn FnMut(ResourceLocation, Resource),
    ) {
        let Some(namespace_dir) = self.namespace_dir(domain, namespace) else {
            return;
        };
        let prefix = prefix.split('/').filter(|segment| !segment.is_empty());
        let Some(start) = join_segments(namespace_dir.clone(), prefix) else {
            return;
        };
        if !start.is_dir() {
            return;
        }
        for entry in WalkDir::new(&start)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
        {
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&namespace_dir) else {
                continue;
            };
            let path = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let location = match ResourceLocation::new(namespace, &path) {
                Ok(location) => location,
                Err(err) => {
                    error!(
                        "Invalid path in pack '{}': {namespace}:{path}, ignoring ({err})",
                        self.info.id
                    );
                    continue;
                }
            };
            if let Some(resource) = self.read(entry.path()) {
                out(location, resource);
            }
        }
    }

    fn namespaces(&self, domain: PackType) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.root.join(domain.directory())) else {
            return Vec::new();
        };
        let mut namespaces: Vec<String> = entries
            .filter_map(Result::ok)
            .filter(|entry| entry.path().is_dir())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        namespaces.sort();
        namespaces
    }
}

/// Append `segments` to `base`, refusing any path that is not normalized.
///
/// Empty, `.` and `..` segments and segments carrying a separator or drive
/// prefix yield `None`, so a lookup can never leave `base`.
fn join_segments<'a, I>(base: PathBuf, segments: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a str>,
{
    segments.into_iter().try_fold(base, |path, segment| {
        let normalized = !matches!(segment, "" | "." | "..")
            && !segment.contains(['/', '\\', ':']);
        if normalized {
            Some(path.join(segment))
        } else {
            debug!("Refusing non-normalized path segment '{segment}'");
            None
        }
    })
}

/// Discover pack directories under `root`, in sorted order.
///
/// A missing root is an empty folder.
pub fn discover_pack_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err).with_context(|| format!("Failed to read {}", root.display())),
    };

    let mut dirs = Vec::new();
    for entry in entries {
        let entry =
            entry.with_context(|| format!("Failed to read dir entry in {}", root.display()))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push(path);
        }
    }

    dirs.sort();
    Ok(dirs)
}

/// Repository source over a folder of user packs.
///
/// Discovery is lenient: unreadable packs are skipped with a warning.
#[derive(Debug, Clone)]
pub struct FolderSource {
    root: PathBuf,
    domain: PackType,
}

impl FolderSource {
    /// Source over the packs in `root`, served as `domain`.
    pub fn new(root: PathBuf, domain: PackType) -> Self {
        Self { root, domain }
    }
}

impl RepositorySource for FolderSource {
    fn load_packs(&mut self, consumer: &mut dyn FnMut(Pack)) {
        let pack_dirs = match discover_pack_dirs(&self.root) {
            Ok(pack_dirs) => pack_dirs,
            Err(err) => {
                warn!("Failed to scan pack dir {}: {err:#}", self.root.display());
                return;
            }
        };
        let selection = PackSelectionConfig {
            required: false,
            default_position: OverrideDirection::Top,
            fixed_position: false,
        };
        for pack_dir in pack_dirs {
            let resources = match FolderPack::open(&pack_dir) {
                Ok(resources) => resources,
                Err(err) => {
                    warn!("Skipping pack {}: {err:#}", pack_dir.display());
                    continue;
                }
            };
            debug!("Found pack '{}' in {}", resources.pack_id(), self.root.display());
            if let Some(pack) = Pack::with_selection(Arc::new(resources), self.domain, selection) {
                consumer(pack);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_temp_root() -> PathBuf {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!(
            "packweave_folder_source_{}_{timestamp}",
            std::process::id()
        ))
    }

    fn write_pack(root: &Path, name: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("pack create");
        fs::write(
            dir.join(PACK_MCMETA_FILE),
            r#"{"pack":{"description":"test","pack_format":61},"filter":{"block":[]}}"#,
        )
        .expect("write mcmeta");
        dir
    }

    #[test]
    fn discovery_is_sorted_and_lenient() {
        let root = unique_temp_root();
        write_pack(&root, "b_pack");
        write_pack(&root, "a_pack");
        // No metadata file at all.
        fs::create_dir_all(root.join("c_broken")).expect("pack create");
        // Metadata without a pack section.
        let no_section = root.join("d_no_section");
        fs::create_dir_all(&no_section).expect("pack create");
        fs::write(no_section.join(PACK_MCMETA_FILE), "{}").expect("write mcmeta");

        let mut source = FolderSource::new(root.clone(), PackType::ServerData);
        let mut ids = Vec::new();
        source.load_packs(&mut |pack| ids.push(pack.id().to_string()));
        assert_eq!(ids, vec!["a_pack", "b_pack"]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_is_empty() {
        let mut source = FolderSource::new(unique_temp_root().join("absent"), PackType::ServerData);
        let mut count = 0;
        source.load_packs(&mut |_| count += 1);
        assert_eq!(count, 0);
    }

    #[test]
    fn serves_files_and_sections() {
        let root = unique_temp_root();
        let dir = write_pack(&root, "content");
        let recipes = dir.join("data/yarn/recipe");
        fs::create_dir_all(recipes.join("nested")).expect("dirs");
        fs::write(recipes.join("b.json"), "{}").expect("write");
        fs::write(recipes.join("a.json"), "{}").expect("write");
        fs::write(recipes.join("nested/c.json"), "{}").expect("write");
        fs::write(recipes.join("Bad.json"), "{}").expect("write");
        fs::create_dir_all(dir.join("data/c")).expect("dirs");

        let pack = FolderPack::open(&dir).expect("pack opens");
        assert_eq!(pack.pack_id(), "content");
        assert_eq!(pack.pack_metadata().expect("pack section").pack_format, 61);
        assert!(pack.metadata_section("filter").is_some());
        assert!(pack.root_resource(&[PACK_MCMETA_FILE]).is_some());
        assert_eq!(pack.namespaces(PackType::ServerData), vec!["c", "yarn"]);

        let mut seen = Vec::new();
        pack.list_resources(PackType::ServerData, "yarn", "recipe", &mut |location, _| {
            seen.push(location.to_string())
        });
        assert_eq!(
            seen,
            vec![
                "yarn:recipe/a.json",
                "yarn:recipe/b.json",
                "yarn:recipe/nested/c.json"
            ]
        );
        let location = ResourceLocation::parse("yarn:recipe/a.json").unwrap();
        assert!(pack.get_resource(PackType::ServerData, &location).is_some());
        assert!(pack.get_resource(PackType::ClientResources, &location).is_none());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn lookups_stay_inside_the_pack() {
        let root = unique_temp_root();
        let dir = write_pack(&root.join("packs"), "content");
        fs::create_dir_all(dir.join("data/ns/recipe")).expect("dirs");
        fs::write(dir.join("data/ns/recipe/a.json"), "{}").expect("write");
        fs::write(root.join("secret.txt"), "secret").expect("write");
        fs::create_dir_all(dir.join("data/ns/loot")).expect("dirs");
        fs::write(dir.join("data/ns/loot/b.json"), "{}").expect("write");

        let pack = FolderPack::open(&dir).expect("pack opens");
        for escape in [
            "ns:../../../../secret.txt",
            "ns:recipe/../../../../../secret.txt",
            "ns:recipe/./a.json",
            "ns:recipe//a.json",
            "..:packs/secret.txt",
        ] {
            let location = ResourceLocation::parse(escape).unwrap();
            assert!(
                pack.get_resource(PackType::ServerData, &location).is_none(),
                "{escape} resolved"
            );
        }
        assert!(pack.root_resource(&["..", "..", "secret.txt"]).is_none());
        assert!(pack.root_resource(&["../../secret.txt"]).is_none());
        assert!(pack.root_resource(&[PACK_MCMETA_FILE]).is_some());

        let mut seen = Vec::new();
        let mut collect = |location: ResourceLocation, _: Resource| seen.push(location.to_string());
        pack.list_resources(PackType::ServerData, "ns", "../ns/loot", &mut collect);
        pack.list_resources(PackType::ServerData, "ns", "recipe/..", &mut collect);
        pack.list_resources(PackType::ServerData, "..", "", &mut collect);
        pack.list_resources(PackType::ServerData, "ns", "recipe/", &mut collect);
        assert_eq!(seen, vec!["ns:recipe/a.json"]);

        let _ = fs::remove_dir_all(&root);
    }
}
