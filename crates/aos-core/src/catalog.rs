//! Catalog parser: builds a [`Faction`] from BattleScribe catalog documents
//!
//! A faction is described by up to four XML documents in one directory: the
//! faction document, a unit ("Library") document, a shared lore document,
//! and optionally a variant (Army of Renown) document that supersedes the
//! faction document as the source of faction-wide rules. The documents are
//! externally maintained and vary faction-to-faction, so absent
//! substructure degrades to empty sub-results with a warning; only a fully
//! missing required document is fatal.

use crate::error::{Error, Result};
use crate::model::{Ability, Faction, Unit, Weapon};
use crate::schema;
use crate::xml::{self, Element};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Collaborator that materializes catalog documents on disk
///
/// The core never performs network I/O itself: it scans for missing
/// documents and defers to an implementation of this trait exactly once
/// before giving up with [`Error::DataNotFound`].
pub trait DocumentProvisioner {
    /// Guarantee that the documents for the given faction (and variant, if
    /// any) exist under `data_dir`, or fail
    fn provision(&self, faction: &str, variant: Option<&str>, data_dir: &Path) -> Result<()>;
}

/// Resolved paths of the documents describing one faction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogDocuments {
    /// The faction's own document
    pub faction: PathBuf,
    /// The unit roster document
    pub units: PathBuf,
    /// The variant document, when a variant was requested
    pub variant: Option<PathBuf>,
    /// The shared spell/prayer/manifestation lore document
    pub lores: PathBuf,
}

impl CatalogDocuments {
    /// Paths that must exist for a parse to proceed
    fn required(&self) -> Vec<&PathBuf> {
        let mut paths = vec![&self.faction, &self.units, &self.lores];
        if let Some(variant) = &self.variant {
            paths.push(variant);
        }
        paths
    }
}

/// Resolve the document paths for a faction and optional variant
///
/// Some variants are filed under different display names than their
/// catalog filenames, so when the direct variant path does not exist the
/// directory is scanned: the filename token after the last ` - ` separator
/// is accepted if it is a substring of the requested variant name
/// (case-sensitive, first match in filename order wins).
pub fn locate_documents(
    faction: &str,
    variant: Option<&str>,
    data_dir: &Path,
) -> Result<CatalogDocuments> {
    let cat = schema::DATA_FILE_EXTENSION;
    let sep = schema::FILE_NAME_SEPARATOR;

    let faction_file = data_dir.join(format!("{}{}", faction, cat));
    let unit_file = data_dir.join(format!("{}{}{}{}", faction, sep, schema::UNIT_FILE_TOKEN, cat));
    let lore_file = data_dir.join(format!("{}{}", schema::LORE_FILE_STEM, cat));

    let variant_file = match variant {
        None => None,
        Some(name) => {
            let direct = data_dir.join(format!("{}{}{}{}", faction, sep, name, cat));
            if direct.is_file() {
                Some(direct)
            } else {
                Some(scan_for_variant_document(name, data_dir)?.unwrap_or(direct))
            }
        }
    };

    Ok(CatalogDocuments {
        faction: faction_file,
        units: unit_file,
        variant: variant_file,
        lores: lore_file,
    })
}

/// Scan a data directory for a variant document filed under a partial name
fn scan_for_variant_document(variant: &str, data_dir: &Path) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(data_dir)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let token = stem
            .rsplit(schema::FILE_NAME_SEPARATOR)
            .next()
            .unwrap_or(stem)
            .trim();

        if variant.contains(token) {
            return Ok(Some(path.to_path_buf()));
        }
    }

    Ok(None)
}

/// Report which required documents are absent, without reading any of them
pub fn missing_documents(
    faction: &str,
    variant: Option<&str>,
    data_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let documents = locate_documents(faction, variant, data_dir)?;

    Ok(documents
        .required()
        .into_iter()
        .filter(|path| !path.is_file())
        .cloned()
        .collect())
}

/// Parse the catalog documents for a faction already present on disk
pub fn parse_faction(faction: &str, variant: Option<&str>, data_dir: &Path) -> Result<Faction> {
    if let Some(path) = missing_documents(faction, variant, data_dir)?.into_iter().next() {
        return Err(Error::DataNotFound { path });
    }

    let documents = locate_documents(faction, variant, data_dir)?;
    parse_documents(faction, &documents)
}

/// Parse the catalog documents for a faction, deferring to a provisioner
/// once if any required document is missing
pub fn parse_faction_with(
    faction: &str,
    variant: Option<&str>,
    data_dir: &Path,
    provisioner: &dyn DocumentProvisioner,
) -> Result<Faction> {
    if !missing_documents(faction, variant, data_dir)?.is_empty() {
        debug!(faction, ?variant, "catalog documents missing, provisioning");
        provisioner.provision(faction, variant, data_dir)?;
    }

    parse_faction(faction, variant, data_dir)
}

fn parse_documents(faction: &str, documents: &CatalogDocuments) -> Result<Faction> {
    debug!(faction, "parsing catalog documents");

    // A variant document supersedes the faction document for faction-wide
    // rules; the unit roster always comes from the unit document.
    let rules_path = documents.variant.as_ref().unwrap_or(&documents.faction);
    let rules_root = xml::parse_file(rules_path)?;
    let lore_root = xml::parse_file(&documents.lores)?;
    let unit_root = xml::parse_file(&documents.units)?;

    Ok(Faction {
        name: faction.to_string(),
        battle_traits: battle_traits(&rules_root),
        battle_formations: battle_formations(&rules_root),
        enhancements_available: enhancements(&rules_root),
        lores_available: lores(&rules_root, &lore_root),
        units: units(&unit_root),
    })
}

/// Extract the faction's always-active battle traits
///
/// Some factions split their core rules across two schema locations: the
/// Battle Traits selection entry plus extra profiles under sharedProfiles.
fn battle_traits(root: &Element) -> Vec<Ability> {
    let entry = root
        .child(schema::SHARED_SELECTION_ENTRIES)
        .and_then(|entries| {
            entries
                .children_named(schema::SELECTION_ENTRY)
                .find(|e| e.attr_contains(schema::NAME_ATTR, schema::BATTLE_TRAITS_MARKER))
        });

    let Some(entry) = entry else {
        warn!("no Battle Traits entry in catalog document");
        return Vec::new();
    };

    let mut traits: Vec<Ability> = entry
        .find_all(&[schema::PROFILES, schema::PROFILE])
        .into_iter()
        .map(ability_from_profile)
        .collect();

    if let Some(shared_profiles) = root.child(schema::SHARED_PROFILES) {
        traits.extend(
            shared_profiles
                .children_named(schema::PROFILE)
                .map(ability_from_profile),
        );
    }

    traits
}

/// Extract the formation-name to granted-ability mapping; empty when the
/// faction declares no formations
fn battle_formations(root: &Element) -> BTreeMap<String, Ability> {
    let group = root
        .child(schema::SHARED_SELECTION_ENTRY_GROUPS)
        .and_then(|groups| {
            groups
                .children_named(schema::SELECTION_ENTRY_GROUP)
                .find(|g| e_name_contains(g, schema::BATTLE_FORMATIONS_MARKER))
        });

    let Some(group) = group else {
        return BTreeMap::new();
    };

    let mut formations = BTreeMap::new();
    for formation in group.find_all(&[schema::SELECTION_ENTRIES, schema::SELECTION_ENTRY]) {
        let Some(name) = formation.attr(schema::NAME_ATTR) else {
            continue;
        };

        match formation.find(&[schema::PROFILES, schema::PROFILE]) {
            Some(profile) => {
                formations.insert(name.to_string(), ability_from_profile(profile));
            }
            None => warn!(formation = name, "battle formation has no profile"),
        }
    }

    formations
}

/// Extract enhancement tables from every group matching a known
/// enhancement-category label
fn enhancements(root: &Element) -> BTreeMap<String, Vec<Ability>> {
    let Some(groups) = root.child(schema::SHARED_SELECTION_ENTRY_GROUPS) else {
        return BTreeMap::new();
    };

    let mut tables = BTreeMap::new();

    let category_groups = groups.children_named(schema::SELECTION_ENTRY_GROUP).filter(|g| {
        schema::ENHANCEMENT_CATEGORY_LABELS
            .iter()
            .any(|label| e_name_contains(g, label))
    });

    for category in category_groups {
        for table in category.find_deep(&[schema::SELECTION_ENTRY_GROUPS, schema::SELECTION_ENTRY_GROUP]) {
            let Some(name) = table.attr(schema::NAME_ATTR) else {
                continue;
            };

            let abilities: Vec<Ability> = table
                .find_deep(&[
                    schema::SELECTION_ENTRIES,
                    schema::SELECTION_ENTRY,
                    schema::PROFILES,
                    schema::PROFILE,
                ])
                .into_iter()
                .map(ability_from_profile)
                .collect();

            tables.insert(name.to_string(), abilities);
        }
    }

    tables
}

/// Extract the lores available to the faction and resolve their abilities
/// from the shared lore document
fn lores(root: &Element, lore_root: &Element) -> BTreeMap<String, Vec<Ability>> {
    let mut names: Vec<String> = Vec::new();

    if let Some(groups) = root.child(schema::SHARED_SELECTION_ENTRY_GROUPS) {
        let lore_groups = groups.children_named(schema::SELECTION_ENTRY_GROUP).filter(|g| {
            schema::LORE_CATEGORY_LABELS
                .iter()
                .any(|label| e_name_contains(g, label))
        });

        for group in lore_groups {
            for lore in group.find_deep(&[schema::SELECTION_ENTRIES, schema::SELECTION_ENTRY]) {
                if let Some(name) = lore.attr(schema::NAME_ATTR) {
                    if !names.iter().any(|n| n == name) {
                        names.push(name.to_string());
                    }
                }
            }
        }
    }

    // Universal manifestation lores are not always declared per-faction
    for name in schema::GENERAL_MANIFESTATION_LORES {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }

    let shared_groups = lore_root.child(schema::SHARED_SELECTION_ENTRY_GROUPS);

    let mut lores = BTreeMap::new();
    for name in names {
        let group = shared_groups.and_then(|groups| {
            groups
                .children_named(schema::SELECTION_ENTRY_GROUP)
                .find(|g| e_name_contains(g, &name))
        });

        let abilities = match group {
            Some(group) => group
                .find_deep(&[
                    schema::SELECTION_ENTRIES,
                    schema::SELECTION_ENTRY,
                    schema::PROFILES,
                    schema::PROFILE,
                ])
                .into_iter()
                .map(ability_from_profile)
                .collect(),
            None => {
                warn!(lore = %name, "lore not found in shared lore document");
                Vec::new()
            }
        };

        lores.insert(name, abilities);
    }

    lores
}

/// Extract every unit in a unit document
fn units(root: &Element) -> Vec<Unit> {
    let Some(entries) = root.child(schema::SHARED_SELECTION_ENTRIES) else {
        warn!("no shared selection entries in unit document");
        return Vec::new();
    };

    let shared_profiles = root.child(schema::SHARED_PROFILES);

    entries
        .children_named(schema::SELECTION_ENTRY)
        .filter_map(|entry| unit_from_entry(entry, shared_profiles))
        .collect()
}

fn unit_from_entry(entry: &Element, shared_profiles: Option<&Element>) -> Option<Unit> {
    let keywords = entry.child(schema::CATEGORY_LINKS).map(|links| {
        links
            .children
            .iter()
            .filter_map(|link| link.attr(schema::NAME_ATTR))
            .collect::<Vec<_>>()
            .join(",")
    });

    let mut abilities = Vec::new();
    let mut stats: Option<BTreeMap<String, String>> = None;

    for profile in entry.find_all(&[schema::PROFILES, schema::PROFILE]) {
        let kind = profile.attr(schema::TYPE_NAME_ATTR).unwrap_or_default();

        if kind.contains(schema::ABILITY_TYPE_MARKER) {
            abilities.push(ability_from_profile(profile));
        } else if kind.contains(schema::UNIT_TYPE_MARKER)
            || kind.contains(schema::MANIFESTATION_TYPE_MARKER)
        {
            stats = Some(characteristics(profile));
        }
    }

    let name = entry.attr(schema::NAME_ATTR).unwrap_or_default().to_string();

    let Some(stats) = stats else {
        warn!(entry = %name, "selection entry has no unit profile, skipping");
        return None;
    };

    // Shared rules (e.g. weapon-team rules) are attached by reference
    // rather than duplicated inline. Cross-references to universal rules
    // absent from the per-faction data are skipped.
    if let Some(link) = entry.find(&[schema::INFO_LINKS, schema::INFO_LINK]) {
        if let Some(linked_name) = link.attr(schema::NAME_ATTR) {
            let linked = shared_profiles.and_then(|profiles| {
                profiles
                    .children_named(schema::PROFILE)
                    .find(|p| p.attr(schema::NAME_ATTR) == Some(linked_name))
            });

            if let Some(profile) = linked {
                abilities.push(ability_from_profile(profile));
            }
        }
    }

    let (weapons, weapon_abilities) = weapon_profiles(entry);
    abilities.extend(weapon_abilities);

    Some(Unit {
        name,
        move_: stats.get(schema::MOVE_CHAR).cloned().unwrap_or_default(),
        health: stats.get(schema::HEALTH_CHAR).cloned().unwrap_or_default(),
        control: stats.get(schema::CONTROL_CHAR).cloned(),
        banishment: stats.get(schema::BANISHMENT_CHAR).cloned(),
        save: stats.get(schema::SAVE_CHAR).cloned().unwrap_or_default(),
        keywords,
        weapons,
        abilities,
    })
}

/// Extract a unit's weapon profiles plus any abilities granted by weapon
/// options
///
/// Weapon entries sit either directly under a loadout entry or one level
/// down inside an option group. The same profile can be reachable through
/// several option paths; duplicates collapse by value equality.
fn weapon_profiles(entry: &Element) -> (Vec<Weapon>, Vec<Ability>) {
    let mut weapons = Vec::new();
    let mut seen: HashSet<Weapon> = HashSet::new();
    let mut granted = Vec::new();

    for loadout in entry.find_all(&[schema::SELECTION_ENTRIES, schema::SELECTION_ENTRY]) {
        let mut options = loadout.find_all(&[
            schema::SELECTION_ENTRY_GROUPS,
            schema::SELECTION_ENTRY_GROUP,
            schema::SELECTION_ENTRIES,
            schema::SELECTION_ENTRY,
        ]);
        if options.is_empty() {
            options = vec![loadout];
        }

        for option in options {
            // A weapon choice can itself grant a special rule
            if let Some(profile) = option.find(&[schema::PROFILES, schema::PROFILE]) {
                granted.push(ability_from_profile(profile));
            }

            for weapon_entry in option.find_all(&[schema::SELECTION_ENTRIES, schema::SELECTION_ENTRY]) {
                let Some(profile) = weapon_entry.find(&[schema::PROFILES, schema::PROFILE]) else {
                    continue;
                };

                let chars = characteristics(profile);
                let weapon = Weapon {
                    name: profile.attr(schema::NAME_ATTR).unwrap_or_default().to_string(),
                    kind: profile
                        .attr(schema::TYPE_NAME_ATTR)
                        .unwrap_or_default()
                        .to_string(),
                    range: chars.get(schema::RANGE_CHAR).cloned(),
                    attacks: chars.get(schema::ATTACKS_CHAR).cloned().unwrap_or_default(),
                    hit: chars.get(schema::HIT_CHAR).cloned().unwrap_or_default(),
                    wound: chars.get(schema::WOUND_CHAR).cloned().unwrap_or_default(),
                    rend: chars.get(schema::REND_CHAR).cloned().unwrap_or_default(),
                    damage: chars.get(schema::DAMAGE_CHAR).cloned().unwrap_or_default(),
                    keywords: chars.get(schema::WEAPON_KEYWORDS_CHAR).cloned(),
                };

                if seen.insert(weapon.clone()) {
                    weapons.push(weapon);
                }
            }
        }
    }

    (weapons, granted)
}

/// Read a profile's characteristics into a name-to-text map
fn characteristics(profile: &Element) -> BTreeMap<String, String> {
    profile
        .find_all(&[schema::CHARACTERISTICS, schema::CHARACTERISTIC])
        .into_iter()
        .filter_map(|c| {
            c.attr(schema::NAME_ATTR)
                .map(|name| (name.to_string(), c.text.clone()))
        })
        .collect()
}

/// Build an [`Ability`] from a profile element
///
/// The cost characteristic appears under one of several field names
/// depending on the ability kind; whichever is present wins.
fn ability_from_profile(profile: &Element) -> Ability {
    let chars = characteristics(profile);
    let cost_key = schema::COST_KEYS.iter().find(|key| chars.contains_key(**key));

    Ability {
        name: profile.attr(schema::NAME_ATTR).unwrap_or_default().to_string(),
        kind: profile
            .attr(schema::TYPE_NAME_ATTR)
            .unwrap_or_default()
            .to_string(),
        timing: chars.get(schema::TIMING_CHAR).cloned(),
        keywords: chars.get(schema::KEYWORDS_CHAR).cloned(),
        declare: chars.get(schema::DECLARE_CHAR).cloned(),
        effect: chars.get(schema::EFFECT_CHAR).cloned().unwrap_or_default(),
        cost: cost_key.and_then(|key| chars.get(*key).cloned()),
    }
}

fn e_name_contains(element: &Element, needle: &str) -> bool {
    element.attr_contains(schema::NAME_ATTR, needle)
}
