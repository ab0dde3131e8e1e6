//! tileloader CLI - Command-line interface
//!
//! Drives the tileloader library: warm the cache around a location, inspect
//! or clear the disk cache, and manage the configuration file.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::warm::WarmArgs;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tileloader")]
#[command(version, about = "Fetch and cache map tiles", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tileloader/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print debug logging to stdout
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the disk cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Load the tiles around a location into the cache
    Warm {
        /// Latitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Longitude in decimal degrees
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        /// Zoom level
        #[arg(long)]
        zoom: u16,

        /// Tiles to load on each side of the centre tile
        #[arg(long, default_value = "2")]
        radius: u32,

        /// Seconds to wait for each batch of tiles
        #[arg(long, default_value = "60")]
        timeout: u64,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Config { command } => commands::config::run(command, cli.config.as_deref()),
        Commands::Cache { action } => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
            commands::cache::run(&runner, action)
        }
        Commands::Warm {
            lat,
            lon,
            zoom,
            radius,
            timeout,
        } => {
            let runner = CliRunner::new(cli.config.as_deref(), cli.verbose)?;
            commands::warm::run(
                &runner,
                WarmArgs {
                    lat,
                    lon,
                    zoom,
                    radius_tiles: radius,
                    timeout: Duration::from_secs(timeout),
                },
            )
        }
    }
}
