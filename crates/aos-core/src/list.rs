//! List-text parser: recovers a structured army list from pasted free text
//!
//! The input is produced by an external list-building app and copy-pasted
//! by users, so formatting is unreliable: line breaks go missing around
//! known tokens, point values appear in several shapes, and noise lines
//! (drops, wounds, app metadata) are interleaved with content. Parsing
//! runs in stages: text normalization, noise removal, positional field
//! extraction, line classification, and finally resolution against a
//! parsed [`Faction`].

use crate::catalog::{self, DocumentProvisioner};
use crate::error::{Error, Result};
use crate::model::{Ability, ArmyList, Enhancement, Faction, Unit};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Alternate field separator the source app sometimes emits instead of
/// line breaks
const ALT_FIELD_SEPARATOR: char = '|';

/// Tokens after which a lost line break is re-inserted (every occurrence)
const BREAK_AFTER_TOKENS: [&str; 1] = ["pts"];

/// Section-start tokens before which a lost line break is re-inserted
/// (first occurrence each)
const BREAK_BEFORE_TOKENS: [&str; 9] = [
    "General's",
    "Drops",
    "Spell ",
    "Prayer ",
    "Manifestation ",
    "Battle Tactic ",
    "Regiment ",
    "Faction Terrain",
    "Created ",
];

/// Lines containing any of these substrings carry no list content
const NOISE_TOKENS: [&str; 12] = [
    "General's",
    "Drops",
    "Regiment",
    "Faction Terrain",
    "App",
    "Created",
    "Data",
    "Version",
    "Auxiliaries",
    "Wounds",
    "----",
    // Temporary exclusion: the one faction shipping a split battletome
    "Orruk Warclans",
];

/// Separator between a unit name and its modifiers after bullet rewriting
const MODIFIER_SEPARATOR: &str = " & ";

const TACTICS_HEADER: &str = "Battle Tactic Cards";
const TACTICS_SEPARATOR: &str = ", ";
const LORE_MARKER: &str = "Lore ";
const AOR_MARKER: &str = "Army of Renown";
const FACTION_VARIANT_SEPARATOR: &str = " - ";

/// Marker prefixing alternate-named unit profiles
const ALT_WARSCROLL_MARKER: &str = "Scourge of Ghyran";

static POINTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(\s*[-+]?\d+\s*\)\s*").expect("valid regex"));
static POINTS_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+Points").expect("valid regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\u{2022}\s*").expect("valid regex"));

/// The structural fields recovered from pasted text, before resolution
/// against catalog data
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSketch {
    pub name: String,
    pub faction: String,
    pub army_of_renown: Option<String>,
    pub battle_formation: Option<String>,
    pub lores: Vec<String>,
    pub battle_tactics: Vec<String>,
    /// Unit lines with modifiers attached via [`MODIFIER_SEPARATOR`]
    pub units: Vec<String>,
}

/// Parse pasted army-list text and resolve it against catalog data at
/// `data_dir`
pub fn parse_list(text: &str, data_dir: &Path) -> Result<ArmyList> {
    let sketch = parse_sketch(text)?;
    let faction = catalog::parse_faction(&sketch.faction, sketch.army_of_renown.as_deref(), data_dir)?;

    Ok(resolve_sketch(&sketch, &faction))
}

/// Like [`parse_list`], deferring to a provisioner for missing documents
pub fn parse_list_with(
    text: &str,
    data_dir: &Path,
    provisioner: &dyn DocumentProvisioner,
) -> Result<ArmyList> {
    let sketch = parse_sketch(text)?;
    let faction = catalog::parse_faction_with(
        &sketch.faction,
        sketch.army_of_renown.as_deref(),
        data_dir,
        provisioner,
    )?;

    Ok(resolve_sketch(&sketch, &faction))
}

/// Extract the structural fields from pasted text
///
/// Line 1 is always the list name. Line 2's shape decides the remaining
/// layout via a strict ordered check: a faction/variant separator wins,
/// then an explicit Army of Renown marker line, then a plain faction name
/// with an optional battle-formation line. The fixed start offsets match
/// the layouts the source app actually produces.
pub fn parse_sketch(text: &str) -> Result<ListSketch> {
    let cleaned = remove_noise(&normalize_text(text));
    let lines: Vec<&str> = cleaned.lines().collect();

    if lines.len() < 2 {
        return Err(Error::EmptyList);
    }

    let mut sketch = ListSketch {
        name: lines[0].to_string(),
        ..ListSketch::default()
    };

    let line2 = lines[1];
    let line3 = lines.get(2).copied().unwrap_or("");

    let content_start;
    if line2.contains(FACTION_VARIANT_SEPARATOR) {
        let mut parts = line2.split(FACTION_VARIANT_SEPARATOR);
        sketch.faction = parts.next().unwrap_or_default().to_string();
        sketch.army_of_renown = parts.next().map(str::to_string);
        content_start = if line3.contains(AOR_MARKER) { 3 } else { 2 };
    } else if lines.iter().any(|line| *line == AOR_MARKER) {
        sketch.faction = line2.to_string();
        sketch.army_of_renown = Some(line3.to_string());
        content_start = 4;
    } else {
        sketch.faction = line2.to_string();

        if !line3.is_empty() && !line3.starts_with(TACTICS_HEADER) && !line3.contains(LORE_MARKER) {
            sketch.battle_formation = Some(line3.to_string());
            content_start = 3;
        } else {
            content_start = 2;
        }
    }

    for line in lines.iter().skip(content_start) {
        if line.starts_with(TACTICS_HEADER) {
            let names = line.replace(TACTICS_HEADER, "").replace(':', "");
            sketch.battle_tactics = names
                .trim()
                .split(TACTICS_SEPARATOR)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
        } else if line.contains(LORE_MARKER) {
            let dashless = line.replace('-', "");
            if let Some((_, lore_name)) = dashless.split_once(LORE_MARKER) {
                let lore_name = lore_name.trim();
                if !lore_name.is_empty() {
                    sketch.lores.push(lore_name.to_string());
                }
            }
        } else {
            // Alternate-named profiles are emitted both as written and in
            // the corrected "Name (Marker)" form
            if line.starts_with(ALT_WARSCROLL_MARKER) {
                let corrected = correct_alternate_warscroll_name(line, ALT_WARSCROLL_MARKER);
                sketch.units.push(remove_points(&corrected));
            }
            sketch.units.push(remove_points(line.trim()));
        }
    }

    debug!(name = %sketch.name, "parsed list sketch");

    Ok(sketch)
}

/// Resolve a sketch against a parsed faction
///
/// Names that fail to resolve are silently omitted: pasted text is not
/// guaranteed complete or typo-free, and the built list may only select
/// data that exists in the faction.
pub fn resolve_sketch(sketch: &ListSketch, faction: &Faction) -> ArmyList {
    let battle_formation = sketch.battle_formation.as_ref().and_then(|name| {
        faction
            .battle_formations
            .get(name)
            .map(|ability| (name.clone(), ability.clone()))
    });

    ArmyList {
        name: sketch.name.clone(),
        battle_tactics: sketch.battle_tactics.clone(),
        faction: sketch.faction.clone(),
        battle_traits: faction.battle_traits.clone(),
        battle_formation,
        enhancements: resolve_enhancements(&sketch.units, faction),
        lores: resolve_lores(&sketch.lores, faction),
        units: resolve_units(&sketch.units, faction),
    }
}

fn resolve_units(unit_lines: &[String], faction: &Faction) -> Vec<Unit> {
    let mut units = Vec::new();

    for line in unit_lines {
        let name = line.split(MODIFIER_SEPARATOR).next().unwrap_or(line);
        units.extend(faction.units.iter().filter(|u| u.name == name).cloned());
    }

    units
}

/// Attribute modifier tokens to their carrier unit
///
/// Tokens matching an ability in any enhancement table become granted
/// enhancements; anything else ("Reinforced") is kept as a status note.
fn resolve_enhancements(
    unit_lines: &[String],
    faction: &Faction,
) -> BTreeMap<String, Vec<Enhancement>> {
    let mut enhancements = BTreeMap::new();

    for line in unit_lines {
        let mut parts = line.split(MODIFIER_SEPARATOR);
        let Some(carrier) = parts.next() else {
            continue;
        };

        let mut slots = Vec::new();
        for token in parts {
            let granted: Vec<Enhancement> = faction
                .enhancements_available
                .values()
                .flatten()
                .filter(|ability| ability.name == token)
                .map(|ability| Enhancement::Granted(ability.clone()))
                .collect();

            if granted.is_empty() {
                slots.push(Enhancement::Status(token.to_string()));
            } else {
                slots.extend(granted);
            }
        }

        if !slots.is_empty() {
            enhancements.insert(carrier.to_string(), slots);
        }
    }

    enhancements
}

/// Select the faction lores named in the pasted list
///
/// Lore names in pasted lists and catalog data disagree for some variants,
/// so both sides are canonicalized and a catalog lore is selected when
/// every word of its canonical name appears in a canonical pasted name.
fn resolve_lores(lore_lines: &[String], faction: &Faction) -> BTreeMap<String, Vec<Ability>> {
    let pasted: Vec<String> = lore_lines.iter().map(|l| canonical_lore_name(l)).collect();

    let mut lores = BTreeMap::new();
    for (catalog_name, abilities) in &faction.lores_available {
        let canonical = canonical_lore_name(catalog_name);

        let selected = pasted.iter().any(|pasted_name| {
            canonical
                .split(' ')
                .all(|word| pasted_name.contains(word))
        });

        if selected {
            lores.insert(catalog_name.clone(), abilities.clone());
        }
    }

    lores
}

/// Reduce a lore name to a canonical form by rewriting its category
/// prefix/suffix marker, e.g. "Spell Lore - Lore of the Storm" and
/// "Lore of the Storm (Spell Lore)" both mention "Spell Lore" somewhere
fn canonical_lore_name(name: &str) -> String {
    for category in ["Spell", "Prayer", "Manifestation"] {
        let marker = format!("{} Lore", category);
        if name.contains(&marker) {
            let stripped = name.replace(&marker, "").replace(':', "");
            return format!("{} {}", category, stripped.trim());
        }
    }

    name.trim().to_string()
}

/// Rewrite "<Marker> <Unit>" into "<Unit> (<Marker>)"
fn correct_alternate_warscroll_name(text: &str, marker: &str) -> String {
    let corrected = text.replace(marker, "");
    format!("{} ({})", corrected.trim(), marker)
}

/// Strip embedded point values from a unit line
pub fn remove_points(text: &str) -> String {
    let cleaned = POINTS_RE.replace_all(text, " ");
    let cleaned = POINTS_WORD_RE.replace_all(&cleaned, "");
    let cleaned = WHITESPACE_RE.replace_all(&cleaned, " ");

    cleaned.trim().to_string()
}

/// Restore formatting of pasted text whose line breaks went missing
fn normalize_text(text: &str) -> String {
    let mut normed = text.replace(ALT_FIELD_SEPARATOR, "\n");

    for token in BREAK_AFTER_TOKENS {
        normed = insert_break_after(&normed, token);
    }
    for token in BREAK_BEFORE_TOKENS {
        normed = insert_break_before(&normed, token);
    }

    let normed = normed.replace("  ", " ");

    // Bullets denote unit modifiers; attach them to the unit line
    BULLET_RE.replace_all(&normed, MODIFIER_SEPARATOR).into_owned()
}

/// Drop blank lines and lines carrying no list content
fn remove_noise(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !NOISE_TOKENS.iter().any(|token| line.contains(token)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Insert a line break after every occurrence of `token`, consuming any
/// whitespace that followed it
fn insert_break_after(text: &str, token: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = text;

    while let Some(idx) = rest.find(token) {
        let end = idx + token.len();
        out.push_str(&rest[..end]);
        out.push('\n');
        rest = rest[end..].trim_start();
    }

    out.push_str(rest);
    out
}

/// Insert a line break before the first occurrence of `token`, replacing
/// any whitespace that preceded it
fn insert_break_before(text: &str, token: &str) -> String {
    let Some(idx) = text.find(token) else {
        return text.to_string();
    };

    let prefix_end = text[..idx].trim_end().len();
    format!("{}\n{}", &text[..prefix_end], &text[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ability(name: &str) -> Ability {
        Ability {
            name: name.to_string(),
            kind: "Ability (Passive)".to_string(),
            timing: None,
            keywords: None,
            declare: None,
            effect: "Effect text.".to_string(),
            cost: None,
        }
    }

    fn unit(name: &str) -> Unit {
        Unit {
            name: name.to_string(),
            move_: "5\"".to_string(),
            health: "2".to_string(),
            control: Some("1".to_string()),
            banishment: None,
            save: "3+".to_string(),
            keywords: None,
            weapons: Vec::new(),
            abilities: vec![ability(&format!("{} Rule", name))],
        }
    }

    fn faction() -> Faction {
        Faction {
            name: "Stormcast Eternals".to_string(),
            battle_traits: vec![ability("Trait")],
            battle_formations: BTreeMap::from([(
                "Shield Wall".to_string(),
                ability("Hold the Line"),
            )]),
            enhancements_available: BTreeMap::from([(
                "Relics of the Storm".to_string(),
                vec![ability("Stormbound Blade")],
            )]),
            lores_available: BTreeMap::from([(
                "Lore of the Storm".to_string(),
                vec![ability("Thunderclap")],
            )]),
            units: vec![unit("Liberators"), unit("Liberator-Prime")],
        }
    }

    #[test]
    fn test_remove_points_plain() {
        assert_eq!(remove_points("Liberators (160)"), "Liberators");
    }

    #[test]
    fn test_remove_points_with_points_word() {
        assert_eq!(remove_points("Liberator-Prime (80 Points)"), "Liberator-Prime");
    }

    #[test]
    fn test_remove_points_signed_enhancement_cost() {
        assert_eq!(
            remove_points("Liberators (160) & Stormbound Blade (+20)"),
            "Liberators & Stormbound Blade"
        );
    }

    #[test]
    fn test_normalize_reconstructs_line_breaks() {
        let text = "Liberators 160 pts Battle Tactic Cards: First Strike";
        let normed = normalize_text(text);
        assert_eq!(normed, "Liberators 160 pts\nBattle Tactic Cards: First Strike");
    }

    #[test]
    fn test_normalize_attaches_bullet_modifiers() {
        let text = "Liberators (160)\n \u{2022} Stormbound Blade";
        assert_eq!(normalize_text(text), "Liberators (160) & Stormbound Blade");
    }

    #[test]
    fn test_remove_noise_drops_metadata_lines() {
        let text = "My List\nDrops: 3\nWounds: 40\nCreated with App v2\n\nLiberators (160)";
        assert_eq!(remove_noise(text), "My List\nLiberators (160)");
    }

    #[test]
    fn test_sketch_canonical_fixture() {
        let text = "Test List\nStormcast Eternals\nBattle Tactic Cards: First Strike, Total Commitment\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.name, "Test List");
        assert_eq!(sketch.faction, "Stormcast Eternals");
        assert_eq!(sketch.battle_formation, None);
        assert_eq!(sketch.battle_tactics, vec!["First Strike", "Total Commitment"]);
        assert_eq!(sketch.units, vec!["Liberators"]);
    }

    #[test]
    fn test_sketch_faction_variant_separator() {
        let text = "My List\nFactionX - SubName\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.faction, "FactionX");
        assert_eq!(sketch.army_of_renown.as_deref(), Some("SubName"));
        assert_eq!(sketch.units, vec!["Liberators"]);
    }

    #[test]
    fn test_sketch_explicit_army_of_renown_marker() {
        let text = "My List\nFactionX\nSubName\nArmy of Renown\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.faction, "FactionX");
        assert_eq!(sketch.army_of_renown.as_deref(), Some("SubName"));
        // Content starts at the fixed offset past the marker block
        assert_eq!(sketch.units, vec!["Liberators"]);
    }

    #[test]
    fn test_sketch_battle_formation_line() {
        let text = "My List\nStormcast Eternals\nShield Wall\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.battle_formation.as_deref(), Some("Shield Wall"));
        assert_eq!(sketch.units, vec!["Liberators"]);
    }

    #[test]
    fn test_sketch_lore_lines() {
        let text = "My List\nStormcast Eternals\n- Spell Lore - Lore of the Storm\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.battle_formation, None);
        assert_eq!(sketch.lores, vec!["Lore of the Storm"]);
    }

    #[test]
    fn test_sketch_alternate_warscroll_doubles_entry() {
        let text = "My List\nStormcast Eternals\nScourge of Ghyran Liberators (160)";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(
            sketch.units,
            vec!["Liberators (Scourge of Ghyran)", "Scourge of Ghyran Liberators"]
        );
    }

    #[test]
    fn test_sketch_empty_input_is_fatal() {
        assert!(matches!(parse_sketch(""), Err(Error::EmptyList)));
        assert!(matches!(parse_sketch("Just a name"), Err(Error::EmptyList)));
    }

    #[test]
    fn test_resolve_canonical_fixture() {
        let text = "Test List\nStormcast Eternals\nBattle Tactic Cards: First Strike, Total Commitment\nLiberators (160)";
        let sketch = parse_sketch(text).unwrap();
        let list = resolve_sketch(&sketch, &faction());

        assert_eq!(list.name, "Test List");
        assert_eq!(list.faction, "Stormcast Eternals");
        assert_eq!(list.battle_tactics, vec!["First Strike", "Total Commitment"]);
        assert_eq!(list.units.len(), 1);
        assert_eq!(list.units[0].name, "Liberators");
    }

    #[test]
    fn test_resolve_formation_must_match_exactly() {
        let faction = faction();

        let matched = ListSketch {
            battle_formation: Some("Shield Wall".to_string()),
            ..ListSketch::default()
        };
        assert!(resolve_sketch(&matched, &faction).battle_formation.is_some());

        let unmatched = ListSketch {
            battle_formation: Some("Shield Walls".to_string()),
            ..ListSketch::default()
        };
        assert!(resolve_sketch(&unmatched, &faction).battle_formation.is_none());
    }

    #[test]
    fn test_resolve_enhancements_and_status_notes() {
        let sketch = ListSketch {
            units: vec!["Liberators & Stormbound Blade & Reinforced".to_string()],
            ..ListSketch::default()
        };
        let list = resolve_sketch(&sketch, &faction());

        let slots = &list.enhancements["Liberators"];
        assert_eq!(slots.len(), 2);
        assert!(matches!(&slots[0], Enhancement::Granted(a) if a.name == "Stormbound Blade"));
        assert!(matches!(&slots[1], Enhancement::Status(s) if s == "Reinforced"));

        // The carrier unit itself still resolves by its bare name
        assert_eq!(list.units.len(), 1);
        assert_eq!(list.units[0].name, "Liberators");
    }

    #[test]
    fn test_resolve_lores_tolerates_renamed_variant() {
        let sketch = ListSketch {
            lores: vec!["The Knights of Lore of the Storm".to_string()],
            ..ListSketch::default()
        };
        let list = resolve_sketch(&sketch, &faction());

        assert!(list.lores.contains_key("Lore of the Storm"));
    }

    #[test]
    fn test_resolve_unknown_names_are_omitted() {
        let sketch = ListSketch {
            lores: vec!["Lore of Nothing At All Whatsoever".to_string()],
            units: vec!["Unknown Unit (100)".to_string()],
            ..ListSketch::default()
        };
        let list = resolve_sketch(&sketch, &faction());

        assert!(list.lores.is_empty());
        assert!(list.units.is_empty());
        assert!(list.enhancements.is_empty());
    }

    #[test]
    fn test_canonical_lore_name() {
        assert_eq!(
            canonical_lore_name("Spell Lore: Lore of the Storm"),
            "Spell Lore of the Storm"
        );
        assert_eq!(canonical_lore_name(" Plain Name "), "Plain Name");
    }

    #[test]
    fn test_collapsed_single_line_list() {
        // Everything on one line, as the app sometimes pastes it
        let text =
            "Test List|Stormcast Eternals Battle Tactic Cards: First Strike Liberators 100 pts";
        let sketch = parse_sketch(text).unwrap();

        assert_eq!(sketch.name, "Test List");
        assert_eq!(sketch.faction, "Stormcast Eternals");
        assert_eq!(sketch.battle_tactics, vec!["First Strike Liberators 100 pts"]);
    }
}
