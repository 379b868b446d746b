//! Ability timing classifier: groups a list's abilities by game phase
//!
//! Every ability attached to an [`ArmyList`] is bucketed into one of a
//! fixed set of phase/timing labels, tagged with a source describing where
//! it came from (battle traits, formation, lore, enhancement carrier, or
//! unit). A second grouping duplicates phase-agnostic "Any ..." buckets
//! into both players' turns for turn-ordered display.

use crate::model::{Ability, ArmyList, Enhancement};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Every known phase/timing label, in turn-sequence order
pub const ALL_PHASES: [&str; 25] = [
    "Passive",
    "Reaction",
    "Deployment Phase",
    "Start of Battle Round",
    "Start of Your Turn",
    "Your Hero Phase",
    "Your Movement Phase",
    "Your Shooting Phase",
    "Your Charge Phase",
    "Your Combat Phase",
    "End of Your Turn",
    "Start of Enemy Turn",
    "Enemy Hero Phase",
    "Enemy Movement Phase",
    "Enemy Shooting Phase",
    "Enemy Charge Phase",
    "Enemy Combat Phase",
    "End of Enemy Turn",
    "Start of Any Turn",
    "Any Hero Phase",
    "Any Movement Phase",
    "Any Shooting Phase",
    "Any Charge Phase",
    "Any Combat Phase",
    "End of Any Turn",
];

/// Bucket for abilities that name no phase of their own
pub const DEFAULT_TIMING: &str = "Passive";

const ANY_TURN_TOKEN: &str = "Any";
const YOUR_TURN_TOKEN: &str = "Your";
const ENEMY_TURN_TOKEN: &str = "Enemy";

/// An ability paired with a label describing where it came from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AbilityWithSource {
    pub ability: Ability,
    pub source: String,
}

impl AbilityWithSource {
    pub fn new(ability: Ability, source: impl Into<String>) -> Self {
        Self {
            ability,
            source: source.into(),
        }
    }

    /// De-formatted ability name
    pub fn name(&self) -> String {
        self.ability.display_name()
    }

    /// De-formatted timing label
    pub fn timing(&self) -> Option<String> {
        self.ability.display_timing()
    }

    /// De-formatted declare text
    pub fn declare(&self) -> Option<String> {
        self.ability.display_declare()
    }

    /// De-formatted effect text
    pub fn effect(&self) -> String {
        self.ability.display_effect()
    }

    /// De-formatted keywords
    pub fn keywords(&self) -> Option<String> {
        self.ability.display_keywords()
    }

    /// Cost with its kind-specific label
    pub fn cost(&self) -> Option<String> {
        self.ability.cost_label()
    }
}

/// Collect every ability attached to a list, tagged with its origin
pub fn abilities_with_sources(list: &ArmyList) -> Vec<AbilityWithSource> {
    let mut abilities = Vec::new();

    for trait_ability in &list.battle_traits {
        abilities.push(AbilityWithSource::new(trait_ability.clone(), "Battle Traits"));
    }

    if let Some((name, ability)) = &list.battle_formation {
        abilities.push(AbilityWithSource::new(
            ability.clone(),
            format!("Battle Formation: {}", name),
        ));
    }

    for (lore_name, lore_abilities) in &list.lores {
        for ability in lore_abilities {
            abilities.push(AbilityWithSource::new(
                ability.clone(),
                format!("Lore: {}", lore_name),
            ));
        }
    }

    for (carrier, slots) in &list.enhancements {
        for slot in slots {
            if let Enhancement::Granted(ability) = slot {
                abilities.push(AbilityWithSource::new(
                    ability.clone(),
                    format!("{} (Enhancement)", carrier),
                ));
            }
        }
    }

    for unit in &list.units {
        for ability in &unit.abilities {
            abilities.push(AbilityWithSource::new(ability.clone(), unit.name.clone()));
        }
    }

    abilities
}

/// Group a list's unique abilities by the phase/timing they occur in
///
/// Matching is tried in order: a phase label contained in the ability's
/// type tag wins, then one contained in its timing text; anything else
/// lands in the default bucket. Buckets are sets: duplicate
/// (ability, source) pairs collapse.
pub fn group_by_timing(list: &ArmyList) -> HashMap<String, HashSet<AbilityWithSource>> {
    let mut groups: HashMap<String, HashSet<AbilityWithSource>> = ALL_PHASES
        .iter()
        .map(|phase| (phase.to_string(), HashSet::new()))
        .collect();

    for entry in abilities_with_sources(list) {
        let phase = classify(&entry);
        groups.entry(phase.to_string()).or_default().insert(entry);
    }

    debug!(list = %list.name, "grouped abilities by timing");

    groups
}

fn classify(entry: &AbilityWithSource) -> &'static str {
    if let Some(phase) = ALL_PHASES.iter().find(|p| entry.ability.kind.contains(**p)) {
        return phase;
    }

    let timing = entry.timing();
    if let Some(timing) = timing.as_deref() {
        if let Some(phase) = ALL_PHASES.iter().find(|p| timing.contains(**p)) {
            return phase;
        }
    }

    DEFAULT_TIMING
}

/// Group abilities by phase with "Any ..." buckets merged into both turns
///
/// An ability relevant in any turn is relevant in each player's turn, so
/// its bucket is duplicated under the "Your"- and "Enemy"-substituted
/// labels; the raw "Any" label does not appear in the output.
pub fn group_by_phase_merged(list: &ArmyList) -> HashMap<String, HashSet<AbilityWithSource>> {
    let mut merged: HashMap<String, HashSet<AbilityWithSource>> = HashMap::new();

    for (timing, abilities) in group_by_timing(list) {
        if !timing.contains(ANY_TURN_TOKEN) {
            merged.entry(timing).or_default().extend(abilities);
            continue;
        }

        let your_timing = timing.replace(ANY_TURN_TOKEN, YOUR_TURN_TOKEN);
        let enemy_timing = timing.replace(ANY_TURN_TOKEN, ENEMY_TURN_TOKEN);

        merged
            .entry(your_timing)
            .or_default()
            .extend(abilities.iter().cloned());
        merged.entry(enemy_timing).or_default().extend(abilities);
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Unit;
    use std::collections::BTreeMap;

    fn ability(name: &str, kind: &str, timing: Option<&str>) -> Ability {
        Ability {
            name: name.to_string(),
            kind: kind.to_string(),
            timing: timing.map(str::to_string),
            keywords: None,
            declare: None,
            effect: "Effect.".to_string(),
            cost: None,
        }
    }

    fn list() -> ArmyList {
        ArmyList {
            name: "Test List".to_string(),
            battle_tactics: Vec::new(),
            faction: "FactionX".to_string(),
            battle_traits: vec![ability("Trait", "Ability (Passive)", None)],
            battle_formation: Some((
                "Shield Wall".to_string(),
                ability("Hold the Line", "Ability (Activated)", Some("Any Combat Phase")),
            )),
            enhancements: BTreeMap::from([(
                "Liberators".to_string(),
                vec![
                    Enhancement::Granted(ability(
                        "Stormbound Blade",
                        "Ability (Activated)",
                        Some("Your Combat Phase"),
                    )),
                    Enhancement::Status("Reinforced".to_string()),
                ],
            )]),
            lores: BTreeMap::from([(
                "Lore of the Storm".to_string(),
                vec![ability("Thunderclap", "Spell", Some("Your Hero Phase"))],
            )]),
            units: vec![Unit {
                name: "Liberators".to_string(),
                move_: "5\"".to_string(),
                health: "2".to_string(),
                control: Some("1".to_string()),
                banishment: None,
                save: "3+".to_string(),
                keywords: None,
                weapons: Vec::new(),
                abilities: vec![
                    ability("Stalwart Defenders", "Ability (Passive)", None),
                    ability("Shields Up", "Ability (Reaction)", Some("**Reaction:**")),
                ],
            }],
        }
    }

    #[test]
    fn test_sources_are_attributed() {
        let sources: Vec<(String, String)> = abilities_with_sources(&list())
            .into_iter()
            .map(|entry| (entry.ability.name.clone(), entry.source))
            .collect();

        assert!(sources.contains(&("Trait".to_string(), "Battle Traits".to_string())));
        assert!(sources.contains(&(
            "Hold the Line".to_string(),
            "Battle Formation: Shield Wall".to_string()
        )));
        assert!(sources.contains(&(
            "Thunderclap".to_string(),
            "Lore: Lore of the Storm".to_string()
        )));
        assert!(sources.contains(&(
            "Stormbound Blade".to_string(),
            "Liberators (Enhancement)".to_string()
        )));
        assert!(sources.contains(&("Stalwart Defenders".to_string(), "Liberators".to_string())));
    }

    #[test]
    fn test_status_notes_carry_no_ability() {
        let entries = abilities_with_sources(&list());
        assert!(!entries.iter().any(|e| e.ability.name == "Reinforced"));
    }

    #[test]
    fn test_grouping_is_total_over_fixed_phases() {
        let groups = group_by_timing(&list());

        assert_eq!(groups.len(), ALL_PHASES.len());

        let bucketed: usize = groups.values().map(HashSet::len).sum();
        assert_eq!(bucketed, abilities_with_sources(&list()).len());
    }

    #[test]
    fn test_type_tag_wins_over_timing_text() {
        let groups = group_by_timing(&list());

        // "Ability (Reaction)" classifies by its type tag even though the
        // timing text would also match
        assert!(groups["Reaction"].iter().any(|e| e.ability.name == "Shields Up"));
    }

    #[test]
    fn test_timing_text_match() {
        let groups = group_by_timing(&list());

        assert!(groups["Your Hero Phase"].iter().any(|e| e.ability.name == "Thunderclap"));
        assert!(groups["Any Combat Phase"].iter().any(|e| e.ability.name == "Hold the Line"));
    }

    #[test]
    fn test_unmatched_falls_back_to_passive() {
        let groups = group_by_timing(&list());

        assert!(groups["Passive"].iter().any(|e| e.ability.name == "Trait"));
        assert!(groups["Passive"].iter().any(|e| e.ability.name == "Stalwart Defenders"));
    }

    #[test]
    fn test_duplicate_pairs_collapse() {
        let mut duplicated = list();
        let extra = duplicated.battle_traits[0].clone();
        duplicated.battle_traits.push(extra);

        let groups = group_by_timing(&duplicated);
        let passives = groups["Passive"]
            .iter()
            .filter(|e| e.ability.name == "Trait")
            .count();

        assert_eq!(passives, 1);
    }

    #[test]
    fn test_merged_duplicates_any_into_both_turns() {
        let merged = group_by_phase_merged(&list());

        assert!(merged["Your Combat Phase"].iter().any(|e| e.ability.name == "Hold the Line"));
        assert!(merged["Enemy Combat Phase"].iter().any(|e| e.ability.name == "Hold the Line"));
        assert!(!merged.contains_key("Any Combat Phase"));
    }

    #[test]
    fn test_merged_keeps_existing_turn_abilities() {
        let merged = group_by_phase_merged(&list());

        // The "Your Combat Phase" bucket holds both its own ability and
        // the duplicated "Any" one
        let names: HashSet<String> = merged["Your Combat Phase"]
            .iter()
            .map(|e| e.ability.name.clone())
            .collect();
        assert!(names.contains("Stormbound Blade"));
        assert!(names.contains("Hold the Line"));
    }
}
