//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and runtime creation
//! to reduce duplication across command handlers.

use std::path::Path;

use crate::error::CliError;
use tileloader::config::ConfigFile;
use tileloader::logging::{init_logging_to, LoggingGuard};
use tokio::runtime::Runtime;
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
}

impl CliRunner {
    /// Load config (from `config_path`, or the default location) and
    /// initialize logging to the configured log file.
    ///
    /// # Arguments
    ///
    /// * `verbose` - Also print debug-level log lines to stdout
    pub fn new(config_path: Option<&Path>, verbose: bool) -> Result<Self, CliError> {
        let config = load_config(config_path)?;

        let logging_guard = init_logging_to(&config.logging.file, verbose, verbose)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tileloader v{}", tileloader::VERSION);
        info!("tileloader CLI: {} command", command);
    }

    /// Multi-threaded runtime for commands that drive the loader.
    pub fn runtime(&self) -> Result<Runtime, CliError> {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("tileloader")
            .build()
            .map_err(CliError::Runtime)
    }
}

/// Load the config file at `path`, or the default one.
pub fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}
