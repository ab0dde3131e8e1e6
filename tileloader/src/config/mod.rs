//! File-backed configuration.
//!
//! `config.ini` is read into a [`ConfigFile`], which converts into the
//! programmatic [`LoaderConfig`](crate::loader::LoaderConfig) and the tile
//! [`ProviderRef`](crate::provider::ProviderRef) used by the loader.
//!
//! # Example
//!
//! ```ignore
//! use tileloader::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! let loader_config = config.to_loader_config();
//! let provider = config.to_provider();
//! ```

mod defaults;
mod file;
mod parser;
mod settings;
mod size;
mod writer;

pub use defaults::{
    DEFAULT_LOG_FILE, DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM, DEFAULT_PROVIDER_ID,
    DEFAULT_URL_TEMPLATE,
};
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{CacheSettings, ConfigFile, LoaderSettings, LoggingSettings, ProviderSettings};
pub use size::{display_size, format_size, parse_size, SizeParseError};
