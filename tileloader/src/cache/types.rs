//! Core types for the cache tiers.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default memory budget: 256 MB of decoded RGBA pixels.
pub const DEFAULT_MEMORY_SIZE: u64 = 256 * 1024 * 1024;

/// Default sliding expiration for memory entries (30 minutes).
pub const DEFAULT_MEMORY_IDLE: Duration = Duration::from_secs(1800);

/// Default disk budget: 2 GB.
pub const DEFAULT_DISK_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Cache-related errors.
#[derive(Debug, Error)]
pub enum CacheError {
    /// I/O error during cache operations
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Tile could not be encoded for storage
    #[error("Cache image error: {0}")]
    Image(#[from] image::ImageError),

    /// Invalid cache configuration
    #[error("Invalid cache configuration: {0}")]
    InvalidConfig(String),
}

/// Memory cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCacheConfig {
    /// Budget in estimated bytes (`width * height * 4` per tile)
    pub max_size_bytes: u64,
    /// Entries not accessed for this long are expired
    pub idle_timeout: Duration,
}

impl Default for MemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MEMORY_SIZE,
            idle_timeout: DEFAULT_MEMORY_IDLE,
        }
    }
}

impl MemoryCacheConfig {
    pub fn validate(&self) -> Result<(), CacheError> {
        if self.max_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "memory cache size must be greater than zero".to_string(),
            ));
        }
        if self.idle_timeout.is_zero() {
            return Err(CacheError::InvalidConfig(
                "memory idle timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Disk cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskCacheConfig {
    /// Cache directory root
    pub cache_dir: PathBuf,
    /// Disk budget in bytes
    pub max_size_bytes: u64,
    /// When false the budget is advisory and the tier grows without bound
    pub enforce_limit: bool,
}

impl Default for DiskCacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            max_size_bytes: DEFAULT_DISK_SIZE,
            enforce_limit: false,
        }
    }
}

impl DiskCacheConfig {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(CacheError::InvalidConfig(
                "disk cache directory must not be empty".to_string(),
            ));
        }
        if self.max_size_bytes == 0 {
            return Err(CacheError::InvalidConfig(
                "disk cache size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Platform cache directory for tiles (`~/.cache/tileloader` on Linux).
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tileloader")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cache_config_default() {
        let config = MemoryCacheConfig::default();
        assert_eq!(config.max_size_bytes, 256 * 1024 * 1024);
        assert_eq!(config.idle_timeout, Duration::from_secs(1800));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_memory_cache_config_rejects_zero() {
        let config = MemoryCacheConfig {
            max_size_bytes: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));

        let config = MemoryCacheConfig {
            idle_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_disk_cache_config_default() {
        let config = DiskCacheConfig::default();
        assert_eq!(config.max_size_bytes, 2 * 1024 * 1024 * 1024);
        assert!(!config.enforce_limit);
        assert!(config.cache_dir.ends_with("tileloader"));
    }

    #[test]
    fn test_disk_cache_config_rejects_empty_path() {
        let config = DiskCacheConfig::new("");
        assert!(matches!(
            config.validate(),
            Err(CacheError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_cache_error_display() {
        let err = CacheError::InvalidConfig("bad".to_string());
        assert_eq!(err.to_string(), "Invalid cache configuration: bad");
    }
}
