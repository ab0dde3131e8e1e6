//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show` and `config init` for inspecting
//! and creating the configuration file.

use clap::Subcommand;
use std::path::Path;
use tileloader::config::{config_file_path, ConfigFile};

use crate::error::CliError;
use crate::runner::load_config;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the effective configuration (file values over defaults)
    Show,

    /// Write a configuration file with default values if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, config_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(config_path),
        ConfigCommands::Show => run_show(config_path),
        ConfigCommands::Init => run_init(config_path),
    }
}

/// Show the configuration file path.
fn run_path(config_path: Option<&Path>) -> Result<(), CliError> {
    match config_path {
        Some(path) => println!("{}", path.display()),
        None => println!("{}", config_file_path().display()),
    }
    Ok(())
}

/// Print the effective configuration as INI.
fn run_show(config_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(config_path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Create the configuration file with defaults.
fn run_init(config_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);

    if path.exists() {
        println!("Configuration already exists at {}", path.display());
        return Ok(());
    }

    ConfigFile::default().save_to(&path)?;
    println!("Created {}", path.display());
    Ok(())
}
