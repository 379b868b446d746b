//! AoS Ability Reminders CLI
//!
//! Command-line tool for inspecting parsed factions, army lists, and
//! phase-grouped ability reminders.

use aos_core::{
    group_by_phase_merged, group_by_timing, missing_documents, parse_faction, parse_list,
    AbilityWithSource, ArmyList, Faction, ALL_PHASES,
};
use clap::{Parser, Subcommand};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aos-cli")]
#[command(about = "Age of Sigmar ability reminders", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and summarize a faction's catalog documents
    Faction {
        /// Faction name, matching its catalog file name
        #[arg(short, long)]
        name: String,

        /// Faction variant (Army of Renown)
        #[arg(short, long)]
        variant: Option<String>,

        /// Directory holding the catalog files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Emit the full faction as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Parse a pasted army list against its faction
    List {
        /// Path to a text file holding the pasted list
        #[arg(short, long)]
        file: PathBuf,

        /// Directory holding the catalog files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Emit the resolved list as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Show a list's abilities grouped by game phase
    Phases {
        /// Path to a text file holding the pasted list
        #[arg(short, long)]
        file: PathBuf,

        /// Directory holding the catalog files
        #[arg(short, long)]
        data_dir: PathBuf,

        /// Fold "Any ..." phases into both players' turns
        #[arg(short, long)]
        merged: bool,
    },

    /// Check which catalog documents a faction still needs
    Check {
        /// Faction name, matching its catalog file name
        #[arg(short, long)]
        name: String,

        /// Faction variant (Army of Renown)
        #[arg(short, long)]
        variant: Option<String>,

        /// Directory holding the catalog files
        #[arg(short, long)]
        data_dir: PathBuf,
    },
}

fn main() {
    init_tracing();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> aos_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Faction {
            name,
            variant,
            data_dir,
            json,
        } => cmd_faction(&name, variant.as_deref(), &data_dir, json),
        Commands::List {
            file,
            data_dir,
            json,
        } => cmd_list(&file, &data_dir, json),
        Commands::Phases {
            file,
            data_dir,
            merged,
        } => cmd_phases(&file, &data_dir, merged),
        Commands::Check {
            name,
            variant,
            data_dir,
        } => cmd_check(&name, variant.as_deref(), &data_dir),
    }
}

fn cmd_faction(
    name: &str,
    variant: Option<&str>,
    data_dir: &PathBuf,
    json: bool,
) -> aos_core::Result<()> {
    let faction = parse_faction(name, variant, data_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&faction)?);
        return Ok(());
    }

    print_faction_summary(&faction, variant);

    Ok(())
}

fn print_faction_summary(faction: &Faction, variant: Option<&str>) {
    println!("Faction: {}", faction.name);
    if let Some(variant) = variant {
        println!("Variant: {}", variant);
    }
    println!();
    println!("Battle traits: {}", faction.battle_traits.len());

    println!("Battle formations ({}):", faction.battle_formations.len());
    for name in faction.battle_formations.keys() {
        println!("  {}", name);
    }

    println!("Enhancement tables ({}):", faction.enhancements_available.len());
    for (name, abilities) in &faction.enhancements_available {
        println!("  {} ({} abilities)", name, abilities.len());
    }

    println!("Lores ({}):", faction.lores_available.len());
    for (name, abilities) in &faction.lores_available {
        println!("  {} ({} abilities)", name, abilities.len());
    }

    println!("Units: {}", faction.units.len());
}

fn cmd_list(file: &PathBuf, data_dir: &PathBuf, json: bool) -> aos_core::Result<()> {
    let list = load_list(file, data_dir)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("List: {}", list.name);
    println!("Faction: {}", list.faction);

    if let Some((formation, _)) = &list.battle_formation {
        println!("Battle formation: {}", formation);
    }

    if !list.battle_tactics.is_empty() {
        println!("Battle tactics: {}", list.battle_tactics.join(", "));
    }

    if !list.lores.is_empty() {
        let names: Vec<&str> = list.lores.keys().map(String::as_str).collect();
        println!("Lores: {}", names.join(", "));
    }

    println!();
    println!("Units ({}):", list.units.len());
    for unit in &list.units {
        match list.enhancements.get(&unit.name) {
            Some(slots) => println!("  {} ({} enhancement slots)", unit.name, slots.len()),
            None => println!("  {}", unit.name),
        }
    }

    Ok(())
}

fn cmd_phases(file: &PathBuf, data_dir: &PathBuf, merged: bool) -> aos_core::Result<()> {
    let list = load_list(file, data_dir)?;

    let groups = if merged {
        group_by_phase_merged(&list)
    } else {
        group_by_timing(&list)
    };

    print_phase_groups(&groups);

    Ok(())
}

fn print_phase_groups(groups: &HashMap<String, HashSet<AbilityWithSource>>) {
    for phase in ALL_PHASES {
        let Some(abilities) = groups.get(phase) else {
            continue;
        };
        if abilities.is_empty() {
            continue;
        }

        println!("{}", phase);
        println!("{}", "-".repeat(phase.len()));

        let mut entries: Vec<&AbilityWithSource> = abilities.iter().collect();
        entries.sort_by_key(|e| (e.name(), e.source.clone()));

        for entry in entries {
            match entry.cost() {
                Some(cost) => println!("  {} [{}] ({})", entry.name(), entry.source, cost),
                None => println!("  {} [{}]", entry.name(), entry.source),
            }
        }
        println!();
    }
}

fn cmd_check(name: &str, variant: Option<&str>, data_dir: &PathBuf) -> aos_core::Result<()> {
    let missing = missing_documents(name, variant, data_dir)?;

    if missing.is_empty() {
        println!("All catalog documents for '{}' are present.", name);
        return Ok(());
    }

    println!("Missing catalog documents ({}):", missing.len());
    for path in &missing {
        println!("  {}", path.display());
    }

    std::process::exit(1);
}

fn load_list(file: &PathBuf, data_dir: &PathBuf) -> aos_core::Result<ArmyList> {
    let text = std::fs::read_to_string(file)?;
    parse_list(&text, data_dir)
}
