mod cli;
mod config;
mod db;
mod error;
mod logic;
mod models;
mod store;

use chrono::{DateTime, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use db::Database;
use error::{CompostOpsError, Result};
use logic::balance::{format_ratio, recommend};
use logic::PileService;
use models::{BalanceRecommendation, CompostMethod, EtaResult, Pile, Task};
use serde::Serialize;
use store::{MemoryStore, PileStore};
use tracing_subscriber::EnvFilter;

fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Commands::Init = cli.command {
        Config::setup_interactive(cli.config.as_ref())?;
        return Ok(());
    }

    let config = if Config::exists(cli.config.as_ref()) {
        Config::load(cli.config.as_ref())?
    } else {
        tracing::warn!("No config file found, using defaults. Run `compostops init` to create one.");
        Config::default()
    };

    if cli.scratch {
        tracing::info!("Using scratch in-memory store");
        let service = PileService::new(MemoryStore::new(), &config);
        return execute(&service, &config, cli.command, cli.json, "scratch (in-memory)");
    }

    let db_path = Config::db_path(cli.data_dir.as_ref())?;
    let db = Database::open(&db_path)?;
    let storage = db.path().display().to_string();
    let service = PileService::new(db, &config);
    execute(&service, &config, cli.command, cli.json, &storage)
}

fn execute<S: PileStore>(
    service: &PileService<S>,
    config: &Config,
    command: Commands,
    json: bool,
    storage: &str,
) -> Result<()> {
    service.seed_methods(&config.methods)?;
    let now = Utc::now();

    match command {
        Commands::Init => {}
        Commands::Check => {
            let piles = service.piles()?;
            let active = piles.iter().filter(|p| !p.is_harvested()).count();
            println!("Config: OK");
            println!("Database: {}", storage);
            println!("Methods: {}", service.methods()?.len());
            println!("Piles: {} ({} active)", piles.len(), active);
            println!(
                "Harvest base: {} days",
                service.eta_engine().base_days()
            );
            let rules: Vec<&str> = service
                .task_engine()
                .list_rules()
                .into_iter()
                .map(|(_, name)| name)
                .collect();
            println!("Task rules: {}", rules.join(", "));
        }
        Commands::New { name, method } => {
            let pile = service.create_pile(&name, method.as_deref(), now)?;
            if json {
                print_json(&pile)?;
            } else {
                println!("Created pile #{} \"{}\"", pile.id.unwrap_or_default(), pile.name);
                print_estimate_line(&pile, now);
            }
        }
        Commands::List => {
            let piles = service.piles()?;
            if json {
                print_json(&piles)?;
            } else if piles.is_empty() {
                println!("No piles yet. Start one with `compostops new <name>`.");
            } else {
                for pile in &piles {
                    print_pile_row(pile, now);
                }
            }
        }
        Commands::Show { pile_id } => {
            let pile = service.pile(pile_id)?;
            let method = service.method_for(&pile)?;
            let eta = service.estimate(pile_id, now)?;
            let balance = service.balance(pile_id)?;
            if json {
                print_json(&serde_json::json!({
                    "pile": pile,
                    "method": method,
                    "estimate": eta,
                    "balance": balance,
                }))?;
            } else {
                print_pile_detail(&pile, method.as_ref(), &eta, &balance, now);
            }
        }
        Commands::Add {
            pile_id,
            kind,
            count,
            shredded,
        } => {
            let pile = service.add_material(pile_id, kind, count, shredded, now)?;
            let balance = service.balance(pile_id)?;
            if json {
                print_json(&serde_json::json!({ "pile": pile, "balance": balance }))?;
            } else {
                println!(
                    "Added {} {} to \"{}\"{}",
                    count,
                    kind.as_str().to_lowercase(),
                    pile.name,
                    if shredded { " (shredded)" } else { "" }
                );
                print_balance(&pile, &balance);
                print_estimate_line(&pile, now);
            }
        }
        Commands::Shred { material_id, undo } => {
            let pile = service.set_shredded(material_id, !undo, now)?;
            output_pile_update(&pile, json, now)?;
        }
        Commands::RemoveMaterial { material_id } => {
            let pile = service.remove_material(material_id, now)?;
            output_pile_update(&pile, json, now)?;
        }
        Commands::Vitals {
            pile_id,
            temperature,
            moisture,
        } => {
            let current = service.pile(pile_id)?;
            let pile = service.update_vitals(
                pile_id,
                temperature.unwrap_or(current.temperature),
                moisture.unwrap_or(current.moisture),
                now,
            )?;
            output_pile_update(&pile, json, now)?;
        }
        Commands::Turn { pile_id } => {
            let pile = service.turn_pile(pile_id, now)?;
            output_pile_update(&pile, json, now)?;
        }
        Commands::Harvest { pile_id } => {
            let pile = service.harvest_pile(pile_id, now)?;
            if json {
                print_json(&pile)?;
            } else if let Some(at) = pile.harvested_at {
                println!("\"{}\" harvested on {}", pile.name, format_date(at));
            }
        }
        Commands::Delete { pile_id, yes } => {
            let pile = service.pile(pile_id)?;
            if !yes && !confirm_delete(&pile)? {
                println!("Cancelled");
                return Ok(());
            }
            service.delete_pile(pile_id)?;
            println!("Deleted \"{}\"", pile.name);
        }
        Commands::Methods => {
            let methods = service.methods()?;
            if json {
                print_json(&methods)?;
            } else {
                for method in &methods {
                    println!(
                        "{:>4}  {:<16} {} (midpoint {} days)",
                        method.id.unwrap_or_default(),
                        method.name,
                        method.envelope(),
                        method.midpoint_days()
                    );
                }
            }
        }
        Commands::Tasks => {
            let tasks = service.tasks(now)?;
            if json {
                print_json(&tasks)?;
            } else if tasks.is_empty() {
                println!("Nothing due. Your piles are happy.");
            } else {
                for task in &tasks {
                    print_task(task, now);
                }
            }
        }
        Commands::Reminders => {
            let reminders = service.reminders(now)?;
            if json {
                print_json(&reminders)?;
            } else {
                for reminder in &reminders {
                    println!("[{}] {}", reminder.key, reminder.title);
                    println!("    {}", reminder.body);
                }
            }
        }
        Commands::Balance { pile_id } => {
            let pile = service.pile(pile_id)?;
            let balance = service.balance(pile_id)?;
            if json {
                print_json(&balance)?;
            } else {
                print_balance(&pile, &balance);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn confirm_delete(pile: &Pile) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(format!(
            "Delete \"{}\" and all of its history?",
            pile.name
        ))
        .default(false)
        .interact()
        .map_err(|e| CompostOpsError::Config(format!("Input error: {}", e)))
}

fn output_pile_update(pile: &Pile, json: bool, now: DateTime<Utc>) -> Result<()> {
    if json {
        return print_json(pile);
    }
    println!(
        "Updated \"{}\": {} / {}, {} turns",
        pile.name,
        pile.temperature,
        pile.moisture,
        pile.turns.len()
    );
    print_estimate_line(pile, now);
    Ok(())
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn print_estimate_line(pile: &Pile, now: DateTime<Utc>) {
    match pile.estimated_harvest_at {
        Some(at) => println!(
            "Estimated harvest: {} ({} days from now)",
            format_date(at),
            (at - now).num_days().max(0)
        ),
        None => println!("Estimated harvest: unknown"),
    }
}

fn print_pile_row(pile: &Pile, now: DateTime<Utc>) {
    let status = match (pile.harvested_at, pile.estimated_harvest_at) {
        (Some(at), _) => format!("harvested {}", format_date(at)),
        (None, Some(at)) if at <= now => "ready to check".to_string(),
        (None, Some(at)) => format!("eta {}", format_date(at)),
        (None, None) => "eta unknown".to_string(),
    };
    let balance = recommend(pile.total_brown(), pile.total_green());
    let flag = if balance.severity.needs_attention() {
        balance.severity.symbol()
    } else {
        " "
    };
    println!(
        "{:>4}  {:<20} {:<5} {:<6} B{:<3} G{:<3} {} {}",
        pile.id.unwrap_or_default(),
        pile.name,
        pile.temperature.as_str(),
        pile.moisture.as_str(),
        pile.total_brown(),
        pile.total_green(),
        flag,
        status
    );
}

fn print_pile_detail(
    pile: &Pile,
    method: Option<&CompostMethod>,
    eta: &EtaResult,
    balance: &BalanceRecommendation,
    now: DateTime<Utc>,
) {
    println!("#{} {}", pile.id.unwrap_or_default(), pile.name);
    println!("  Started:      {}", format_date(pile.created_at));
    if let Some(method) = method {
        println!("  Method:       {} ({})", method.name, method.envelope());
    }
    println!("  Temperature:  {}", pile.temperature);
    println!("  Moisture:     {}", pile.moisture);
    println!(
        "  Materials:    {} browns, {} greens{}",
        pile.total_brown(),
        pile.total_green(),
        if pile.any_shredded() { ", shredded" } else { "" }
    );
    match pile.last_turn() {
        Some(at) => println!(
            "  Turns:        {} (last {})",
            pile.turns.len(),
            format_date(at)
        ),
        None => println!("  Turns:        none"),
    }
    if let Some(at) = pile.last_logged {
        println!("  Last logged:  {}", format_date(at));
    }
    for addition in &pile.additions {
        println!(
            "    {:>4}  {:<5} {}{}",
            addition.id.unwrap_or_default(),
            addition.kind().as_str(),
            format_date(addition.created_at),
            if addition.is_shredded { "  shredded" } else { "" }
        );
    }

    println!();
    if let Some(at) = pile.harvested_at {
        println!("  Harvested on {}", format_date(at));
    } else {
        println!(
            "  Harvest ETA:  {} ({} days, {} remaining)",
            format_date(eta.estimated_date),
            eta.effective_days,
            eta.days_remaining(now).max(0)
        );
        println!(
            "  Factors:      temp x{:.2}  moisture x{:.2}  balance x{:.2}  turning x{:.2}  shred x{:.2}",
            eta.temperature_factor,
            eta.moisture_factor,
            eta.balance_factor,
            eta.turning_factor,
            eta.shred_factor
        );
        println!(
            "  Turning rate: {:.1} per month (combined speed x{:.2})",
            eta.inputs.turns_per_month,
            eta.combined_speed()
        );
    }

    println!();
    print_balance(pile, balance);
}

fn print_balance(pile: &Pile, balance: &BalanceRecommendation) {
    println!(
        "{} {} ({}, ratio {:.1})",
        balance.severity.symbol(),
        balance.title,
        format_ratio(pile.total_brown(), pile.total_green()),
        balance.ratio
    );
    println!("  {}", balance.guidance);
    if let Some(step) = balance.next_step() {
        println!("  Next: {}", step);
    }
    println!("  Progress: {:.0}%", balance.progress * 100.0);
}

fn print_task(task: &Task, now: DateTime<Utc>) {
    let marker = if task.is_overdue(now) { "!" } else { " " };
    println!(
        "{} {:<14} #{:<3} {:<20} due {}",
        marker,
        task.kind.as_str(),
        task.pile_id,
        task.pile_name,
        format_date(task.due)
    );
}
