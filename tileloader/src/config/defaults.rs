//! Default values for all configuration settings and the
//! `ConfigFile::default()` implementation.

use super::settings::*;
use crate::cache::{default_cache_dir, DEFAULT_DISK_SIZE, DEFAULT_MEMORY_IDLE, DEFAULT_MEMORY_SIZE};
use crate::loader::{default_worker_count, DEFAULT_QUEUE_CAPACITY};
use crate::provider::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_TILE_SIZE};
use crate::tile::FillStyle;

/// Provider used when the config file names none.
pub const DEFAULT_PROVIDER_ID: &str = "osm";

/// OpenStreetMap standard tile layer.
pub const DEFAULT_URL_TEMPLATE: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

pub const DEFAULT_MIN_ZOOM: u16 = 0;

/// Highest zoom served by the default provider.
pub const DEFAULT_MAX_ZOOM: u16 = 19;

/// Log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "tileloader.log";

impl Default for ConfigFile {
    fn default() -> Self {
        let config_dir = super::file::config_directory();

        Self {
            cache: CacheSettings {
                directory: default_cache_dir(),
                memory_size: DEFAULT_MEMORY_SIZE,
                memory_idle_secs: DEFAULT_MEMORY_IDLE.as_secs(),
                disk_size: DEFAULT_DISK_SIZE,
                enforce_disk_limit: false,
            },
            loader: LoaderSettings {
                queue_capacity: DEFAULT_QUEUE_CAPACITY,
                workers: default_worker_count(),
                request_timeout_ms: DEFAULT_REQUEST_TIMEOUT.as_millis() as u64,
                empty_tile_color: FillStyle::default(),
            },
            provider: ProviderSettings {
                id: DEFAULT_PROVIDER_ID.to_string(),
                url_template: Some(DEFAULT_URL_TEMPLATE.to_string()),
                tile_size: DEFAULT_TILE_SIZE,
                min_zoom: DEFAULT_MIN_ZOOM,
                max_zoom: DEFAULT_MAX_ZOOM,
                api_key: None,
                subdomains: Vec::new(),
            },
            logging: LoggingSettings {
                file: config_dir.join(DEFAULT_LOG_FILE),
            },
        }
    }
}
