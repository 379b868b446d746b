//! Literal names from the BattleScribe catalogue schema
//!
//! The catalog documents are third-party-maintained XML following a fixed
//! schema. Every element name, attribute name, characteristic key, and
//! naming convention the parsers depend on lives here, so a schema-version
//! bump touches exactly one file.

// Element local names (namespace prefix stripped by the XML layer)
pub const SHARED_SELECTION_ENTRIES: &str = "sharedSelectionEntries";
pub const SHARED_SELECTION_ENTRY_GROUPS: &str = "sharedSelectionEntryGroups";
pub const SHARED_PROFILES: &str = "sharedProfiles";
pub const SELECTION_ENTRIES: &str = "selectionEntries";
pub const SELECTION_ENTRY: &str = "selectionEntry";
pub const SELECTION_ENTRY_GROUPS: &str = "selectionEntryGroups";
pub const SELECTION_ENTRY_GROUP: &str = "selectionEntryGroup";
pub const PROFILES: &str = "profiles";
pub const PROFILE: &str = "profile";
pub const CHARACTERISTICS: &str = "characteristics";
pub const CHARACTERISTIC: &str = "characteristic";
pub const CATEGORY_LINKS: &str = "categoryLinks";
pub const INFO_LINKS: &str = "infoLinks";
pub const INFO_LINK: &str = "infoLink";

// Attribute names
pub const NAME_ATTR: &str = "name";
pub const TYPE_NAME_ATTR: &str = "typeName";

// Entry-name markers used to locate faction sub-structures
pub const BATTLE_TRAITS_MARKER: &str = "Battle Traits";
pub const BATTLE_FORMATIONS_MARKER: &str = "Battle Formations";

// Profile typeName markers
pub const UNIT_TYPE_MARKER: &str = "Unit";
pub const MANIFESTATION_TYPE_MARKER: &str = "Manifestation";
pub const ABILITY_TYPE_MARKER: &str = "Ability";

// Characteristic keys for unit stat profiles
pub const MOVE_CHAR: &str = "Move";
pub const HEALTH_CHAR: &str = "Health";
pub const SAVE_CHAR: &str = "Save";
pub const CONTROL_CHAR: &str = "Control";
pub const BANISHMENT_CHAR: &str = "Banishment";

// Characteristic keys for weapon profiles ("Ability" carries weapon keywords)
pub const RANGE_CHAR: &str = "Rng";
pub const ATTACKS_CHAR: &str = "Atk";
pub const HIT_CHAR: &str = "Hit";
pub const WOUND_CHAR: &str = "Wnd";
pub const REND_CHAR: &str = "Rnd";
pub const DAMAGE_CHAR: &str = "Dmg";
pub const WEAPON_KEYWORDS_CHAR: &str = "Ability";

// Characteristic keys for ability profiles
pub const TIMING_CHAR: &str = "Timing";
pub const KEYWORDS_CHAR: &str = "Keywords";
pub const DECLARE_CHAR: &str = "Declare";
pub const EFFECT_CHAR: &str = "Effect";

/// Field names an ability's cost can appear under; at most one is present
pub const COST_KEYS: [&str; 3] = ["Cost", "Casting Value", "Chanting Value"];

/// Selection-entry-group labels that denote enhancement categories
pub const ENHANCEMENT_CATEGORY_LABELS: [&str; 4] = [
    "Artefacts of Power",
    "Heroic Traits",
    "Monstrous Traits",
    "Great Endrinworks",
];

/// Selection-entry-group labels that denote lore categories
pub const LORE_CATEGORY_LABELS: [&str; 3] = [
    "Spell Lore",
    "Prayer Lore",
    "Manifestation Lore",
];

/// Manifestation lores available to every faction, not always declared
/// in the per-faction document
pub const GENERAL_MANIFESTATION_LORES: [&str; 6] = [
    "Aetherwrought Machineries",
    "Forbidden Power",
    "Krondspine Incarnate",
    "Morbid Conjuration",
    "Primal Energy",
    "Twilit Sorceries",
];

// Catalog file naming conventions
pub const DATA_FILE_EXTENSION: &str = ".cat";
pub const FILE_NAME_SEPARATOR: &str = " - ";
pub const UNIT_FILE_TOKEN: &str = "Library";
pub const LORE_FILE_STEM: &str = "Lores";
