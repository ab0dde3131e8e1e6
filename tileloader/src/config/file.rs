//! Configuration file handling for ~/.tileloader/config.ini.
//!
//! Loads and saves user configuration with sensible defaults.
//! Settings structs live in [`super::settings`], constants in [`super::defaults`],
//! parsing in [`super::parser`], and serialization in [`super::writer`].

use ini::Ini;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::settings::ConfigFile;
use crate::cache::{DiskCacheConfig, MemoryCacheConfig};
use crate::loader::LoaderConfig;
use crate::provider::{LocalProvider, ProviderRef, UrlTemplateProvider};

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tileloader/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.tileloader/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_ini_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// The commented INI text `save_to` writes.
    pub fn to_ini_string(&self) -> String {
        super::writer::to_config_string(self)
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// Loader settings described by this file.
    pub fn to_loader_config(&self) -> LoaderConfig {
        LoaderConfig::new(self.cache.directory.clone())
            .with_queue_capacity(self.loader.queue_capacity)
            .with_worker_count(self.loader.workers)
            .with_request_timeout(Duration::from_millis(self.loader.request_timeout_ms))
            .with_empty_tile_fill(self.loader.empty_tile_color)
            .with_memory(MemoryCacheConfig {
                max_size_bytes: self.cache.memory_size,
                idle_timeout: Duration::from_secs(self.cache.memory_idle_secs),
            })
            .with_disk(DiskCacheConfig {
                cache_dir: self.cache.directory.clone(),
                max_size_bytes: self.cache.disk_size,
                enforce_limit: self.cache.enforce_disk_limit,
            })
    }

    /// Tile source described by the `[provider]` section.
    ///
    /// An empty URL template yields a provider whose tiles are all
    /// synthesized locally.
    pub fn to_provider(&self) -> ProviderRef {
        let settings = &self.provider;
        match &settings.url_template {
            None => ProviderRef::new(LocalProvider::new(settings.id.clone(), settings.tile_size)),
            Some(template) => {
                let mut provider = UrlTemplateProvider::new(settings.id.clone(), template.clone())
                    .with_tile_size(settings.tile_size)
                    .with_zoom_range(settings.min_zoom, settings.max_zoom)
                    .with_subdomains(settings.subdomains.iter().cloned());
                if let Some(api_key) = &settings.api_key {
                    provider = provider.with_api_key(api_key.clone());
                }
                ProviderRef::new(provider)
            }
        }
    }
}

/// Get the path to the config directory (~/.tileloader).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileloader")
}

/// Get the path to the config file (~/.tileloader/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DEFAULT_DISK_SIZE, DEFAULT_MEMORY_SIZE};
    use crate::config::DEFAULT_PROVIDER_ID;
    use crate::tile::TileKey;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.provider.id, DEFAULT_PROVIDER_ID);
        assert!(config.provider.url_template.is_some());
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.cache.memory_size, DEFAULT_MEMORY_SIZE);
        assert_eq!(config.cache.disk_size, DEFAULT_DISK_SIZE);
        assert_eq!(config.cache.memory_idle_secs, 1800);
        assert_eq!(config.loader.queue_capacity, 100);
        assert_eq!(config.loader.request_timeout_ms, 5000);
        assert!(!config.cache.enforce_disk_limit);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_to_loader_config() {
        let mut config = ConfigFile::default();
        config.cache.directory = PathBuf::from("/srv/tiles");
        config.cache.memory_idle_secs = 60;
        config.cache.enforce_disk_limit = true;
        config.loader.queue_capacity = 8;
        config.loader.workers = 2;
        config.loader.request_timeout_ms = 750;

        let loader = config.to_loader_config();
        assert_eq!(loader.queue_capacity, 8);
        assert_eq!(loader.worker_count, 2);
        assert_eq!(loader.request_timeout, Duration::from_millis(750));
        assert_eq!(loader.memory.idle_timeout, Duration::from_secs(60));
        assert_eq!(loader.disk.cache_dir, PathBuf::from("/srv/tiles"));
        assert!(loader.disk.enforce_limit);
        assert!(loader.validate().is_ok());
    }

    #[test]
    fn test_to_provider() {
        let mut config = ConfigFile::default();
        let provider = config.to_provider();
        assert_eq!(provider.id(), DEFAULT_PROVIDER_ID);

        let key = TileKey::new(1, 2, 3, provider);
        assert_eq!(
            key.url().as_deref(),
            Some("https://tile.openstreetmap.org/3/1/2.png")
        );

        config.provider.url_template = None;
        config.provider.id = "blank".to_string();
        let key = TileKey::new(1, 2, 3, config.to_provider());
        assert_eq!(key.url(), None);
        assert_eq!(key.provider().id(), "blank");
    }
}
