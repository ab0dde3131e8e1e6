//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;
use tileloader::cache::CacheError;
use tileloader::config::ConfigFileError;
use tileloader::coord::CoordError;
use tileloader::loader::LoaderError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to start the async runtime
    Runtime(std::io::Error),
    /// Failed to start the tile loader
    LoaderStart(LoaderError),
    /// Invalid coordinates or zoom level
    Coordinates(CoordError),
    /// Failed to clear the disk cache
    CacheClear(CacheError),
    /// Failed to read disk cache statistics
    CacheStats(std::io::Error),
    /// Some tiles could not be loaded
    WarmIncomplete { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Config(_) => {
                eprintln!();
                eprintln!("Check the configuration with: tileloader config show");
            }
            CliError::LoaderStart(LoaderError::Cache(_)) => {
                eprintln!();
                eprintln!("Make sure the cache directory is writable, or set");
                eprintln!("[cache] directory in the configuration file.");
            }
            CliError::WarmIncomplete { .. } => {
                eprintln!();
                eprintln!("See the log file for the failing tile URLs.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(e) => write!(f, "Failed to start async runtime: {}", e),
            CliError::LoaderStart(e) => write!(f, "Failed to start tile loader: {}", e),
            CliError::Coordinates(e) => write!(f, "Invalid coordinates: {}", e),
            CliError::CacheClear(e) => write!(f, "Failed to clear cache: {}", e),
            CliError::CacheStats(e) => write!(f, "Failed to read cache statistics: {}", e),
            CliError::WarmIncomplete { failed, total } => {
                write!(f, "{} of {} tiles could not be loaded", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Runtime(e) => Some(e),
            CliError::LoaderStart(e) => Some(e),
            CliError::Coordinates(e) => Some(e),
            CliError::CacheClear(e) => Some(e),
            CliError::CacheStats(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<LoaderError> for CliError {
    fn from(e: LoaderError) -> Self {
        CliError::LoaderStart(e)
    }
}

impl From<CoordError> for CliError {
    fn from(e: CoordError) -> Self {
        CliError::Coordinates(e)
    }
}
