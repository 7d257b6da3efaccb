//! Replays a configured reload and reports the pack order it produces.

use anyhow::{bail, Context, Result};
use packweave_assets::RuntimeResourcePack;
use packweave_core::{
    KnownPack, OverrideDirection, Pack, PackLocationInfo, PackRef, PackSelectionConfig,
    PackSource, PackType, RepositorySource, ResourceLocation, DEFAULT_NAMESPACE,
};
use packweave_splice::{
    assemble_pack_list, CallbackRegistry, InjectingSource, PackCallbacks, VanillaAnchor,
};
use std::{fmt, sync::Arc};
use tracing::{info, warn};

use crate::config::{LayoutConfig, SourceConfig};
use crate::folder_source::FolderSource;

/// Namespace of the packs the inspector generates.
pub const GENERATED_NAMESPACE: &str = "packweave";

/// Build the producer registry a layout describes.
///
/// Pack ids are validated here so configured producers only fail when asked to.
pub fn build_registry(layout: &LayoutConfig) -> Result<CallbackRegistry> {
    let mut registry = CallbackRegistry::new();
    for registration in &layout.registrations {
        for id in &registration.packs {
            ResourceLocation::new(GENERATED_NAMESPACE, id)
                .with_context(|| format!("Invalid pack id '{id}' for {}", registration.position))?;
        }
        for domain in registration.domains() {
            let position = registration.position;
            if registration.fail {
                registry.register(position, domain, move |_| {
                    bail!("producer for {position} configured to fail")
                });
                continue;
            }
            let ids = registration.packs.clone();
            registry.register(position, domain, move |adder| {
                for id in &ids {
                    adder.add(generated_pack(id, domain)?);
                }
                Ok(())
            });
        }
    }
    Ok(registry)
}

fn generated_pack(id: &str, domain: PackType) -> Result<PackRef> {
    let location = ResourceLocation::new(GENERATED_NAMESPACE, id)?;
    Ok(RuntimeResourcePack::new(
        RuntimeResourcePack::create_info(&location, id, env!("CARGO_PKG_VERSION")),
        RuntimeResourcePack::create_metadata("Generated by packweave", domain),
    )
    .into_ref())
}

fn vanilla_pack(id: &str, domain: PackType) -> Result<Pack> {
    let info = PackLocationInfo {
        id: id.to_string(),
        title: "Vanilla".to_string(),
        source: PackSource::BuiltIn,
        known_pack: Some(KnownPack {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: "core".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    };
    let resources = RuntimeResourcePack::new(
        info,
        RuntimeResourcePack::create_metadata("The default look and feel", domain),
    )
    .into_ref();
    let selection = PackSelectionConfig {
        required: true,
        default_position: OverrideDirection::Bottom,
        fixed_position: true,
    };
    Pack::with_selection(resources, domain, selection).context("vanilla pack has no metadata")
}

/// Runtime packs a mod adds to the repository itself.
struct VirtualSource<'a> {
    ids: &'a [String],
    domain: PackType,
}

impl RepositorySource for VirtualSource<'_> {
    fn load_packs(&mut self, consumer: &mut dyn FnMut(Pack)) {
        for id in self.ids {
            let resources = match generated_pack(id, self.domain) {
                Ok(resources) => resources,
                Err(err) => {
                    warn!("Skipping virtual pack '{id}': {err:#}");
                    continue;
                }
            };
            if let Some(pack) = Pack::from_resources(resources, self.domain, OverrideDirection::Top)
            {
                consumer(pack);
            }
        }
    }
}

/// Every pack the sources discover, vanilla first.
pub fn load_repository(
    layout: &LayoutConfig,
    domain: PackType,
    callbacks: &Arc<PackCallbacks>,
) -> Result<Vec<Pack>> {
    let mut repository = vec![vanilla_pack(&layout.vanilla, domain)?];
    let mut push = |pack: Pack| {
        if repository.iter().any(|known| known.id() == pack.id()) {
            warn!("Duplicate pack id '{}', keeping the first", pack.id());
        } else {
            repository.push(pack);
        }
    };
    for source in &layout.sources {
        match source {
            SourceConfig::Folder { path } => {
                let folder = FolderSource::new(path.clone(), domain);
                InjectingSource::new(folder, domain, Arc::clone(callbacks)).load_packs(&mut push);
            }
            SourceConfig::Virtual { packs } => {
                VirtualSource { ids: packs, domain }.load_packs(&mut push);
            }
        }
    }
    Ok(repository)
}

/// Resolve the configured order against the repository, then add required
/// and automatic packs on their default side.
pub fn select_packs(repository: &[Pack], configured: &[String]) -> Vec<Pack> {
    let mut selected: Vec<Pack> = Vec::new();
    for id in configured {
        if selected.iter().any(|pack| pack.id() == id) {
            warn!("Pack '{id}' is selected twice, ignoring the repeat");
            continue;
        }
        match repository.iter().find(|pack| pack.id() == id) {
            Some(pack) => selected.push(pack.clone()),
            None => warn!("Selected pack '{id}' is not available, ignoring"),
        }
    }
    for pack in repository {
        if selected.iter().any(|known| known.id() == pack.id()) {
            continue;
        }
        let automatic = pack.resources().location().source.should_add_automatically();
        if pack.selection().required || automatic {
            pack.default_position()
                .insert(&mut selected, pack.clone(), Pack::selection);
        }
    }
    selected
}

/// One pack in a reported order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderEntry {
    /// Pack id.
    pub id: String,
    /// Decorated title.
    pub title: String,
    /// Whether the pack targets the current format.
    pub compatible: bool,
}

impl OrderEntry {
    fn describe(pack: &PackRef, domain: PackType) -> Self {
        let location = pack.location();
        let compatible = pack
            .pack_metadata()
            .is_some_and(|metadata| metadata.pack_format == domain.current_pack_format());
        Self {
            id: location.id.clone(),
            title: location.source.decorate(&location.title),
            compatible,
        }
    }
}

/// Result of an inspection, lowest priority first.
#[derive(Debug, Clone)]
pub struct InspectReport {
    /// Domain inspected.
    pub domain: PackType,
    /// Selection after the user-pack splice and automatic placement.
    pub selected: Vec<OrderEntry>,
    /// Final list after the aggregate splice.
    pub final_order: Vec<OrderEntry>,
}

#[cfg(test)]
impl InspectReport {
    /// Ids of the final list.
    pub fn final_ids(&self) -> Vec<&str> {
        self.final_order.iter().map(|entry| entry.id.as_str()).collect()
    }

    /// Ids of the selection.
    pub fn selected_ids(&self) -> Vec<&str> {
        self.selected.iter().map(|entry| entry.id.as_str()).collect()
    }
}

fn write_entries(f: &mut fmt::Formatter<'_>, entries: &[OrderEntry]) -> fmt::Result {
    for (index, entry) in entries.iter().enumerate() {
        write!(f, "{index:>4}  {}  [{}]", entry.id, entry.title)?;
        if !entry.compatible {
            write!(f, " (incompatible)")?;
        }
        writeln!(f)?;
    }
    Ok(())
}

impl fmt::Display for InspectReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Selected {} packs (lowest priority first):", self.domain)?;
        write_entries(f, &self.selected)?;
        writeln!(f)?;
        writeln!(f, "Final {} pack order (lowest priority first):", self.domain)?;
        write_entries(f, &self.final_order)
    }
}

/// Replay a reload of `domain` for `layout` using the sealed `callbacks`.
pub fn inspect(
    layout: &LayoutConfig,
    domain: PackType,
    callbacks: &Arc<PackCallbacks>,
) -> Result<InspectReport> {
    for registration in layout.stranded_registrations() {
        warn!(
            "Producer for {} never runs: the layout has no folder source",
            registration.position
        );
    }
    let repository = load_repository(layout, domain, callbacks)?;
    info!("Repository for {domain} holds {} packs", repository.len());
    let selected = select_packs(&repository, &layout.selected);
    let base: Vec<PackRef> = selected
        .iter()
        .map(|pack| Arc::clone(pack.resources()))
        .collect();
    let final_order = assemble_pack_list(
        callbacks,
        domain,
        &base,
        &VanillaAnchor::Id(layout.vanilla.clone()),
    )?;
    Ok(InspectReport {
        domain,
        selected: base.iter().map(|pack| OrderEntry::describe(pack, domain)).collect(),
        final_order: final_order
            .iter()
            .map(|pack| OrderEntry::describe(pack, domain))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use packweave_core::PackPosition;
    use packweave_splice::SpliceError;
    use packweave_testkit::{pack_ids, user_pack};

    const DATA: PackType = PackType::ServerData;

    fn layout(toml: &str) -> LayoutConfig {
        LayoutConfig::from_toml_str(toml).expect("valid layout")
    }

    fn sealed(layout: &LayoutConfig) -> Arc<PackCallbacks> {
        Arc::new(build_registry(layout).expect("valid ids").seal())
    }

    #[test]
    fn full_reload_orders_every_band() {
        let layout = layout(
            r#"
selected = ["vanilla", "mod_runtime"]

[[source]]
kind = "virtual"
packs = ["mod_runtime"]

[[register]]
position = "before_all"
packs = ["first"]

[[register]]
position = "before_vanilla"
packs = ["low_a"]

[[register]]
position = "before_vanilla"
packs = ["low_b"]

[[register]]
position = "after_vanilla"
packs = ["above"]

[[register]]
position = "after_all"
packs = ["last"]
"#,
        );
        let report = inspect(&layout, DATA, &sealed(&layout)).expect("inspect succeeds");
        assert_eq!(report.selected_ids(), vec!["vanilla", "mod_runtime"]);
        assert_eq!(
            report.final_ids(),
            vec!["first", "low_b", "low_a", "vanilla", "above", "mod_runtime", "last"]
        );
        assert!(report.final_order.iter().all(|entry| entry.compatible));
        assert_eq!(report.final_order[3].title, "Vanilla (built-in)");
        assert_eq!(report.final_order[0].title, "first (runtime generated)");
    }

    #[test]
    fn failing_producer_is_isolated() {
        let layout = layout(
            r#"
[[register]]
position = "after_all"
packs = ["never"]
fail = true

[[register]]
position = "after_all"
packs = ["kept"]
"#,
        );
        let report = inspect(&layout, DATA, &sealed(&layout)).unwrap();
        assert_eq!(report.final_ids(), vec!["vanilla", "kept"]);
    }

    #[test]
    fn domain_filter_applies_to_registrations() {
        let layout = layout(
            r#"
[[register]]
position = "after_all"
domain = "assets"
packs = ["client_only"]
"#,
        );
        let callbacks = sealed(&layout);
        assert_eq!(callbacks.callback_count(PackPosition::AfterAll, DATA), 0);
        let report = inspect(&layout, PackType::ClientResources, &callbacks).unwrap();
        assert_eq!(report.final_ids(), vec!["vanilla", "client_only"]);
        assert_eq!(inspect(&layout, DATA, &callbacks).unwrap().final_ids(), vec!["vanilla"]);
    }

    #[test]
    fn custom_vanilla_id_anchors_the_splice() {
        let layout = layout(
            r#"
vanilla = "core"

[[register]]
position = "after_vanilla"
packs = ["above"]
"#,
        );
        let report = inspect(&layout, DATA, &sealed(&layout)).unwrap();
        assert_eq!(report.final_ids(), vec!["core", "above"]);
    }

    #[test]
    fn unknown_anchor_is_fatal() {
        let callbacks = PackCallbacks::empty();
        let err = assemble_pack_list(&callbacks, DATA, &[], &VanillaAnchor::Id("core".into()))
            .unwrap_err();
        assert!(matches!(err, SpliceError::MissingVanillaAnchor { .. }));
    }

    #[test]
    fn invalid_generated_ids_are_rejected_up_front() {
        let layout = layout("[[register]]\nposition = \"after_all\"\npacks = [\"Bad Id\"]\n");
        assert!(build_registry(&layout).is_err());
    }

    #[test]
    fn automatic_packs_land_on_their_default_side() {
        let vanilla = vanilla_pack("vanilla", DATA).unwrap();
        let bottom = Pack::from_resources(
            generated_pack("bottom", DATA).unwrap(),
            DATA,
            OverrideDirection::Bottom,
        )
        .unwrap();
        let top = Pack::from_resources(
            generated_pack("top", DATA).unwrap(),
            DATA,
            OverrideDirection::Top,
        )
        .unwrap();
        let repository = vec![vanilla, bottom, user_pack("p1"), user_pack("p2"), top];
        let configured = vec!["p2".to_string(), "p1".to_string(), "missing".to_string()];
        let selected = select_packs(&repository, &configured);
        assert_eq!(pack_ids(&selected), vec!["vanilla", "bottom", "p2", "p1", "top"]);
    }

    #[test]
    fn user_band_packs_keep_their_side_order() {
        let layout = layout(
            r#"
[[source]]
kind = "folder"
path = "/nonexistent/packweave/resourcepacks"

[[register]]
position = "before_user"
packs = ["b1"]

[[register]]
position = "before_user"
packs = ["b2"]

[[register]]
position = "after_user"
packs = ["t1"]

[[register]]
position = "after_user"
packs = ["t2"]
"#,
        );
        assert!(layout.stranded_registrations().is_empty());
        let report = inspect(&layout, DATA, &sealed(&layout)).unwrap();
        assert_eq!(report.selected_ids(), vec!["vanilla", "b2", "b1", "t1", "t2"]);
        assert_eq!(report.final_ids(), report.selected_ids());
    }
}
