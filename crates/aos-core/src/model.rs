//! Domain model for factions, units, and army lists
//!
//! All records are immutable value types: structural equality and hashing
//! are derived from every field, which is what the parsers rely on for
//! set-based de-duplication of abilities and weapons.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Markup markers the catalog data embeds as display hints for the issuing
/// app; they must never leak into user-facing text
const MARKUP_MARKERS: [&str; 2] = ["^^", "**"];

fn strip_markup(text: &str) -> String {
    let mut cleaned = text.to_string();
    for marker in MARKUP_MARKERS {
        cleaned = cleaned.replace(marker, "");
    }
    cleaned
}

/// A single rule: a battle trait, spell, prayer, enhancement, or unit ability
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ability {
    /// Display name, may carry markup markers
    pub name: String,
    /// Type tag from the schema, e.g. "Ability (Passive)" or "Spell"
    pub kind: String,
    /// Timing label, when the ability names its own phase
    pub timing: Option<String>,
    /// Keyword string, e.g. "Spell, Unlimited"
    pub keywords: Option<String>,
    /// Declare-step text
    pub declare: Option<String>,
    /// Effect text
    pub effect: String,
    /// Command-point cost, casting value, or chanting value depending on
    /// the ability kind
    pub cost: Option<String>,
}

impl Ability {
    /// Name with markup markers stripped
    pub fn display_name(&self) -> String {
        strip_markup(&self.name)
    }

    /// Timing with markup markers stripped
    pub fn display_timing(&self) -> Option<String> {
        self.timing.as_deref().map(strip_markup)
    }

    /// Declare text with markup markers stripped
    pub fn display_declare(&self) -> Option<String> {
        self.declare.as_deref().map(strip_markup)
    }

    /// Effect text with markup markers stripped
    pub fn display_effect(&self) -> String {
        strip_markup(&self.effect)
    }

    /// Keywords with markup markers stripped
    pub fn display_keywords(&self) -> Option<String> {
        self.keywords.as_deref().map(strip_markup)
    }

    /// Cost rendered with the label matching its kind: spells have a
    /// casting value, prayers a chanting value, everything else a CP cost
    pub fn cost_label(&self) -> Option<String> {
        let cost = self.cost.as_ref()?;

        let label = match self.keywords.as_deref() {
            Some(keywords) if keywords.contains("Spell") => "Casting Value",
            Some(keywords) if keywords.contains("Prayer") => "Chanting Value",
            _ => "CP cost",
        };

        Some(format!("{}: {}", label, cost))
    }
}

/// One weapon profile of a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Weapon {
    pub name: String,
    /// Type tag from the schema, e.g. "Melee Weapon"
    pub kind: String,
    /// Range, absent for melee weapons
    pub range: Option<String>,
    pub attacks: String,
    pub hit: String,
    pub wound: String,
    pub rend: String,
    pub damage: String,
    /// Weapon keywords, e.g. "Crit (Mortal)"
    pub keywords: Option<String>,
}

/// One unit profile with its weapons and rules
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub move_: String,
    pub health: String,
    pub control: Option<String>,
    /// Manifestations have a banishment value instead of control
    pub banishment: Option<String>,
    pub save: String,
    /// Joined category keywords, e.g. "HERO,WIZARD"
    pub keywords: Option<String>,
    pub weapons: Vec<Weapon>,
    /// Own rules plus abilities granted by weapon options or attached by
    /// shared cross-reference
    pub abilities: Vec<Ability>,
}

/// The full static ruleset of one faction (or faction variant)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    /// Always-active faction rules
    pub battle_traits: Vec<Ability>,
    /// Formation name to granted ability; empty when the faction has none
    pub battle_formations: BTreeMap<String, Ability>,
    /// Enhancement table name to the abilities in that table
    pub enhancements_available: BTreeMap<String, Vec<Ability>>,
    /// Lore name to its spells/prayers/manifestations
    pub lores_available: BTreeMap<String, Vec<Ability>>,
    pub units: Vec<Unit>,
}

/// An entry in a unit's enhancement slot: either an actual enhancement
/// ability or a plain status note such as "Reinforced"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Enhancement {
    /// An ability granted from one of the faction's enhancement tables
    Granted(Ability),
    /// A non-ability status attached to the unit in the pasted list
    Status(String),
}

/// One player's army list, resolved against a [`Faction`]
///
/// Every ability, weapon, and unit in here exists by value in the faction
/// it was resolved against; a list only selects, it never invents data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmyList {
    pub name: String,
    /// Selected battle tactic names; rules for tactics are not modeled
    pub battle_tactics: Vec<String>,
    /// Faction name as written in the pasted list
    pub faction: String,
    pub battle_traits: Vec<Ability>,
    /// Chosen formation name and the ability it grants
    pub battle_formation: Option<(String, Ability)>,
    /// Carrier unit name to its enhancement slot entries
    pub enhancements: BTreeMap<String, Vec<Enhancement>>,
    /// Only the lores the player actually selected
    pub lores: BTreeMap<String, Vec<Ability>>,
    /// Units present in the list, in the player's stated order
    pub units: Vec<Unit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ability(keywords: Option<&str>, cost: Option<&str>) -> Ability {
        Ability {
            name: "^^Arcane Bolt^^".to_string(),
            kind: "Spell".to_string(),
            timing: Some("**Your Hero Phase**".to_string()),
            keywords: keywords.map(str::to_string),
            declare: Some("Pick a target".to_string()),
            effect: "Roll a dice **now**".to_string(),
            cost: cost.map(str::to_string),
        }
    }

    #[test]
    fn test_display_views_strip_markers() {
        let a = ability(Some("Spell"), Some("7"));
        assert_eq!(a.display_name(), "Arcane Bolt");
        assert_eq!(a.display_timing(), Some("Your Hero Phase".to_string()));
        assert_eq!(a.display_effect(), "Roll a dice now");
    }

    #[test]
    fn test_cost_label_spell() {
        let a = ability(Some("Spell, Unlimited"), Some("7"));
        assert_eq!(a.cost_label(), Some("Casting Value: 7".to_string()));
    }

    #[test]
    fn test_cost_label_prayer() {
        let a = ability(Some("Prayer"), Some("7"));
        assert_eq!(a.cost_label(), Some("Chanting Value: 7".to_string()));
    }

    #[test]
    fn test_cost_label_command() {
        let a = ability(Some("Rampage"), Some("1"));
        assert_eq!(a.cost_label(), Some("CP cost: 1".to_string()));

        let no_keywords = ability(None, Some("1"));
        assert_eq!(no_keywords.cost_label(), Some("CP cost: 1".to_string()));
    }

    #[test]
    fn test_cost_label_absent_without_cost() {
        let a = ability(Some("Spell"), None);
        assert_eq!(a.cost_label(), None);
    }

    #[test]
    fn test_ability_value_equality() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(ability(Some("Spell"), Some("7")));
        set.insert(ability(Some("Spell"), Some("7")));
        assert_eq!(set.len(), 1);
    }
}
