//! INI serialization logic for converting `ConfigFile` → INI string.
//!
//! This module contains the `to_config_string()` function that produces
//! the commented INI representation written to `config.ini`.

use std::path::Path;

use super::settings::ConfigFile;
use super::size::format_size;
use crate::tile::FillStyle;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let url_template = config.provider.url_template.as_deref().unwrap_or("");
    let api_key = config.provider.api_key.as_deref().unwrap_or("");
    let subdomains = config.provider.subdomains.join(",");
    let enforce_disk_limit = if config.cache.enforce_disk_limit {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[cache]
; Root directory of the on-disk tile cache.
; Tiles are stored as <directory>/<provider>/<zoom>/<x>_<y>.png
directory = {}
; Memory budget for decoded tiles (width * height * 4 bytes each)
; Supports: KB, MB, GB suffixes (e.g., 128MB, 1GB)
memory_size = {}
; Seconds a tile may stay unused in memory before it expires (default: 1800)
memory_idle_secs = {}
; Disk budget for cached tiles
; Supports: KB, MB, GB suffixes (e.g., 500MB, 2GB)
disk_size = {}
; Delete least recently used tiles when disk_size is exceeded (default: false)
; When false, disk_size is advisory and the cache grows without bound
enforce_disk_limit = {}

[loader]
; Pending tiles kept before the oldest request is dropped (default: 100)
queue_capacity = {}
; Background workers resolving tiles (default: number of CPU cores)
workers = {}
; HTTP request timeout in milliseconds (default: 5000)
request_timeout_ms = {}
; Fill for tiles that are still loading or have no remote source:
; RRGGBB, RRGGBBAA, checker or transparent
empty_tile_color = {}

[provider]
; Name of the tile source, also used as its cache directory
id = {}
; Tile URL with {{x}}, {{y}}, {{z}}, {{quadkey}}, {{s}} and {{apikey}} placeholders
; Leave empty to synthesize every tile locally
url_template = {}
; Tile edge length in pixels (default: 256)
tile_size = {}
min_zoom = {}
max_zoom = {}
; Substituted for {{apikey}}
api_key = {}
; Comma-separated values rotated through {{s}}
subdomains = {}

[logging]
; Log file, truncated at the start of each session
file = {}
"#,
        path_to_string(&config.cache.directory),
        format_size(config.cache.memory_size),
        config.cache.memory_idle_secs,
        format_size(config.cache.disk_size),
        enforce_disk_limit,
        config.loader.queue_capacity,
        config.loader.workers,
        config.loader.request_timeout_ms,
        fill_to_string(&config.loader.empty_tile_color),
        config.provider.id,
        url_template,
        config.provider.tile_size,
        config.provider.min_zoom,
        config.provider.max_zoom,
        api_key,
        subdomains,
        path_to_string(&config.logging.file),
    )
}

/// Written without the leading `#`, which INI readers may take as a comment.
fn fill_to_string(fill: &FillStyle) -> String {
    fill.to_string().trim_start_matches('#').to_string()
}

/// Convert a path to a string, using ~ for the home directory.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}
