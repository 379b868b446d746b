//! aos-core: Core library for parsing Age of Sigmar catalog files and army lists
//!
//! This library provides functionality to:
//! - Parse BattleScribe catalog (.cat) files into structured faction data
//! - Locate the catalog documents a faction needs inside a data directory
//! - Recover structure from free-text army lists pasted out of list builders
//! - Resolve a parsed list against its faction's units, lores, and enhancements
//! - Group a list's abilities by the game phase they occur in

pub mod catalog;
pub mod error;
pub mod list;
pub mod model;
pub mod schema;
pub mod timing;
pub mod xml;

pub use catalog::{
    locate_documents, missing_documents, parse_faction, parse_faction_with, CatalogDocuments,
    DocumentProvisioner,
};
pub use error::{Error, Result};
pub use list::{parse_list, parse_list_with, parse_sketch, remove_points, resolve_sketch, ListSketch};
pub use model::{Ability, ArmyList, Enhancement, Faction, Unit, Weapon};
pub use timing::{
    abilities_with_sources, group_by_phase_merged, group_by_timing, AbilityWithSource, ALL_PHASES,
    DEFAULT_TIMING,
};
