use crate::models::{MaterialKind, MoistureCategory, TemperatureCategory};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "compostops", version, about = "Compost pile tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override SQLite data directory
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use a throwaway in-memory store; nothing is saved
    #[arg(long, global = true)]
    pub scratch: bool,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config and open the database
    Check,
    /// Start a new pile
    New {
        name: String,
        /// Compost method, e.g. "Hot Compost"
        #[arg(short, long)]
        method: Option<String>,
    },
    /// List piles
    List,
    /// Show a pile with its harvest estimate
    Show { pile_id: i64 },
    /// Log brown or green material
    Add {
        pile_id: i64,
        #[arg(value_parser = parse_material)]
        kind: MaterialKind,
        /// Number of units to add
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u32,
        #[arg(short, long)]
        shredded: bool,
    },
    /// Mark a material addition as shredded
    Shred {
        material_id: i64,
        /// Clear the shredded flag instead
        #[arg(long)]
        undo: bool,
    },
    /// Remove a material addition
    RemoveMaterial { material_id: i64 },
    /// Record temperature and moisture
    Vitals {
        pile_id: i64,
        #[arg(short, long, value_parser = parse_temperature)]
        temperature: Option<TemperatureCategory>,
        #[arg(short, long, value_parser = parse_moisture)]
        moisture: Option<MoistureCategory>,
    },
    /// Record a turn
    Turn { pile_id: i64 },
    /// Mark a pile harvested
    Harvest { pile_id: i64 },
    /// Delete a pile and its history
    Delete {
        pile_id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List compost methods
    Methods,
    /// Show due tasks across all piles
    Tasks,
    /// Show reminders for due tasks
    Reminders,
    /// Brown/green balance advice for a pile
    Balance { pile_id: i64 },
}

fn parse_material(s: &str) -> Result<MaterialKind, String> {
    MaterialKind::from_str(s).ok_or_else(|| format!("unknown material '{}' (brown, green)", s))
}

fn parse_temperature(s: &str) -> Result<TemperatureCategory, String> {
    TemperatureCategory::from_str(s)
        .ok_or_else(|| format!("unknown temperature '{}' (cold, warm, hot)", s))
}

fn parse_moisture(s: &str) -> Result<MoistureCategory, String> {
    MoistureCategory::from_str(s)
        .ok_or_else(|| format!("unknown moisture '{}' (dry, humid, wet)", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_add_with_alias() {
        let cli = Cli::try_parse_from(["compostops", "add", "3", "greens", "-n", "4", "--json"])
            .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Add {
                pile_id,
                kind,
                count,
                shredded,
            } => {
                assert_eq!(pile_id, 3);
                assert_eq!(kind, MaterialKind::Green);
                assert_eq!(count, 4);
                assert!(!shredded);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn rejects_unknown_categories() {
        assert!(Cli::try_parse_from(["compostops", "vitals", "1", "-t", "lukewarm"]).is_err());
        let cli =
            Cli::try_parse_from(["compostops", "vitals", "1", "-t", "HOT", "-m", "moist"]).unwrap();
        match cli.command {
            Commands::Vitals {
                temperature,
                moisture,
                ..
            } => {
                assert_eq!(temperature, Some(TemperatureCategory::Hot));
                assert_eq!(moisture, Some(MoistureCategory::Humid));
            }
            _ => panic!("expected vitals"),
        }
    }
}
