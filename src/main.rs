//! Read-only query tool
//!
//! Loads the settings and the genesis document into an in-memory store and
//! prints the requested view as JSON. Never mutates anything on disk.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cyclic_arb::keeper::{budget, export_genesis, fees, init_genesis, registry, stats};
use cyclic_arb::logging::setup_logging;
use cyclic_arb::{Denom, EngineSettings, MemStore};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing::info;

/// Cyclic arbitrage engine state queries
#[derive(Parser)]
#[command(name = "cyclic-arb")]
struct Args {
    /// Settings file (TOML)
    #[arg(short, long, env = "ARB_SETTINGS", default_value = "config/settings.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Registered routes for every token pair
    Routes,
    /// Base denoms in search priority order
    BaseDenoms,
    /// Point budget ceilings and consumption
    Budget,
    /// Withdrawable developer fees, optionally for one denom
    DeveloperFees { denom: Option<String> },
    /// Executed cycle count and cumulative profit
    Stats,
    /// Re-export the loaded state as a genesis document
    Export,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let settings = EngineSettings::load(&args.settings)?;
    setup_logging(&settings.general.log_level, settings.general.json_logs)?;

    let genesis = settings.load_genesis()?;
    let mut store = MemStore::new();
    init_genesis(&mut store, &genesis).context("Failed to load genesis into memory")?;
    info!("Loaded {} ({} records)", settings.general.genesis_file, store.len());

    match args.command {
        Command::Routes => print_json(&registry::get_all_routes(&store)?),
        Command::BaseDenoms => print_json(&registry::get_base_denoms(&store)?),
        Command::Budget => print_json(&budget::budget_state(&store)?),
        Command::DeveloperFees { denom: Some(denom) } => {
            let denom = Denom::new(denom)?;
            print_json(&fees::get_developer_fees(&store, &denom)?)
        }
        Command::DeveloperFees { denom: None } => print_json(&fees::get_all_developer_fees(&store)?),
        Command::Stats => print_json(&json!({
            "number_of_trades": stats::get_number_of_trades(&store)?,
            "profits": stats::get_all_profits(&store)?,
        })),
        Command::Export => print_json(&export_genesis(&store)?),
    }
}
