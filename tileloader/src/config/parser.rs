//! INI parsing logic for converting `Ini` → `ConfigFile`.
//!
//! This module contains the `parse_ini()` function and its helpers.
//! It is the single place where INI key names are mapped to struct fields.

use ini::Ini;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::ConfigFileError;
use super::settings::ConfigFile;
use super::size::parse_size;
use crate::coord::MAX_ZOOM;
use crate::tile::FillStyle;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [cache] section
    if let Some(section) = ini.section(Some("cache")) {
        if let Some(v) = section.get("directory") {
            let v = v.trim();
            if !v.is_empty() {
                config.cache.directory = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("memory_size") {
            config.cache.memory_size = parse_size(v).map_err(|_| {
                invalid_value(
                    "cache",
                    "memory_size",
                    v,
                    "expected format like '256MB', '1GB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("memory_idle_secs") {
            config.cache.memory_idle_secs =
                parse_positive(v).ok_or_else(|| {
                    invalid_value(
                        "cache",
                        "memory_idle_secs",
                        v,
                        "must be a positive integer (seconds)",
                    )
                })?;
        }
        if let Some(v) = section.get("disk_size") {
            config.cache.disk_size = parse_size(v).map_err(|_| {
                invalid_value(
                    "cache",
                    "disk_size",
                    v,
                    "expected format like '2GB', '500MB', or '1024KB'",
                )
            })?;
        }
        if let Some(v) = section.get("enforce_disk_limit") {
            config.cache.enforce_disk_limit = parse_bool(v);
        }
    }

    // [loader] section
    if let Some(section) = ini.section(Some("loader")) {
        if let Some(v) = section.get("queue_capacity") {
            config.loader.queue_capacity = parse_positive(v).ok_or_else(|| {
                invalid_value("loader", "queue_capacity", v, "must be a positive integer")
            })?;
        }
        if let Some(v) = section.get("workers") {
            config.loader.workers = parse_positive(v).ok_or_else(|| {
                invalid_value("loader", "workers", v, "must be a positive integer")
            })?;
        }
        if let Some(v) = section.get("request_timeout_ms") {
            config.loader.request_timeout_ms = parse_positive(v).ok_or_else(|| {
                invalid_value(
                    "loader",
                    "request_timeout_ms",
                    v,
                    "must be a positive integer (milliseconds)",
                )
            })?;
        }
        if let Some(v) = section.get("empty_tile_color") {
            config.loader.empty_tile_color = FillStyle::from_str(v).map_err(|reason| {
                invalid_value("loader", "empty_tile_color", v, &reason)
            })?;
        }
    }

    // [provider] section
    if let Some(section) = ini.section(Some("provider")) {
        if let Some(v) = section.get("id") {
            let v = v.trim();
            if v.is_empty() || v.contains(['/', '\\']) || v == "." || v == ".." {
                return Err(invalid_value(
                    "provider",
                    "id",
                    v,
                    "must be a non-empty name usable as a directory",
                ));
            }
            config.provider.id = v.to_string();
        }
        if let Some(v) = section.get("url_template") {
            let v = v.trim();
            config.provider.url_template = if v.is_empty() {
                None
            } else if v.starts_with("http://") || v.starts_with("https://") {
                Some(v.to_string())
            } else {
                return Err(invalid_value(
                    "provider",
                    "url_template",
                    v,
                    "must be an http:// or https:// URL, or empty for local tiles",
                ));
            };
        }
        if let Some(v) = section.get("tile_size") {
            config.provider.tile_size = parse_positive(v).ok_or_else(|| {
                invalid_value("provider", "tile_size", v, "must be a positive integer (pixels)")
            })?;
        }
        if let Some(v) = section.get("min_zoom") {
            config.provider.min_zoom = parse_zoom(v).ok_or_else(|| {
                invalid_value("provider", "min_zoom", v, "must be a zoom level between 0 and 30")
            })?;
        }
        if let Some(v) = section.get("max_zoom") {
            config.provider.max_zoom = parse_zoom(v).ok_or_else(|| {
                invalid_value("provider", "max_zoom", v, "must be a zoom level between 0 and 30")
            })?;
        }
        if let Some(v) = section.get("api_key") {
            let v = v.trim();
            if !v.is_empty() {
                config.provider.api_key = Some(v.to_string());
            }
        }
        if let Some(v) = section.get("subdomains") {
            config.provider.subdomains = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    if config.provider.min_zoom > config.provider.max_zoom {
        return Err(invalid_value(
            "provider",
            "min_zoom",
            &config.provider.min_zoom.to_string(),
            "must not exceed max_zoom",
        ));
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid_value(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Parse an integer greater than zero.
fn parse_positive<T>(value: &str) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    value
        .trim()
        .parse::<T>()
        .ok()
        .filter(|parsed| *parsed > T::default())
}

fn parse_zoom(value: &str) -> Option<u16> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|zoom| *zoom <= MAX_ZOOM)
}

/// Parse a boolean value from config (true/false, 1/0, yes/no, on/off).
pub(super) fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand ~ to home directory in paths.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
