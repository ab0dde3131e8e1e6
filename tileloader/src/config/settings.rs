//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use crate::tile::FillStyle;
use std::path::PathBuf;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Cache tier settings
    pub cache: CacheSettings,
    /// Loader queue and worker settings
    pub loader: LoaderSettings,
    /// Tile source settings
    pub provider: ProviderSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// `[cache]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Disk tier root
    pub directory: PathBuf,
    /// Memory budget in bytes
    pub memory_size: u64,
    /// Sliding expiration of memory entries, in seconds
    pub memory_idle_secs: u64,
    /// Disk budget in bytes
    pub disk_size: u64,
    /// Delete least recently used tiles when the disk budget is exceeded
    pub enforce_disk_limit: bool,
}

/// `[loader]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderSettings {
    pub queue_capacity: usize,
    pub workers: usize,
    pub request_timeout_ms: u64,
    /// Fill for placeholders and locally synthesized tiles
    pub empty_tile_color: FillStyle,
}

/// `[provider]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSettings {
    /// Cache directory name and identity of the tile source
    pub id: String,
    /// URL template; `None` synthesizes every tile locally
    pub url_template: Option<String>,
    pub tile_size: u32,
    pub min_zoom: u16,
    pub max_zoom: u16,
    /// Substituted for `{apikey}`
    pub api_key: Option<String>,
    /// Rotated through `{s}`
    pub subdomains: Vec<String>,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
