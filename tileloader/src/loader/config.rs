//! Loader configuration and errors.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::{CacheError, DiskCacheConfig, MemoryCacheConfig};
use crate::provider::{ProviderError, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TILE_SIZE};
use crate::tile::FillStyle;

/// Default number of pending keys held by the work queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Smallest memory budget a loader accepts: one decoded default-size tile.
///
/// A tile whose decoded size exceeds the budget is evicted as soon as it is
/// stored, so every lookup would schedule it again.
pub const MIN_MEMORY_BUDGET: u64 = DEFAULT_TILE_SIZE as u64 * DEFAULT_TILE_SIZE as u64 * 4;

/// Worker count used when the number of logical CPUs cannot be determined.
const FALLBACK_WORKER_COUNT: usize = 4;

/// Errors raised while starting a loader.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("Invalid loader configuration: {0}")]
    InvalidConfig(String),

    #[error("Cache startup failed: {0}")]
    Cache(#[from] CacheError),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(#[from] ProviderError),
}

/// Configuration for a [`TileLoader`](super::TileLoader).
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderConfig {
    /// Pending keys kept before the oldest is displaced
    pub queue_capacity: usize,
    /// Number of background workers
    pub worker_count: usize,
    /// Per-request timeout handed to the HTTP client
    pub request_timeout: Duration,
    /// Fill used for placeholders and for tiles with no remote source
    pub empty_tile_fill: FillStyle,
    pub memory: MemoryCacheConfig,
    pub disk: DiskCacheConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker_count: default_worker_count(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            empty_tile_fill: FillStyle::default(),
            memory: MemoryCacheConfig::default(),
            disk: DiskCacheConfig::default(),
        }
    }
}

impl LoaderConfig {
    /// Default configuration with the disk tier rooted at `cache_dir`.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            disk: DiskCacheConfig::new(cache_dir),
            ..Self::default()
        }
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_empty_tile_fill(mut self, fill: FillStyle) -> Self {
        self.empty_tile_fill = fill;
        self
    }

    pub fn with_memory(mut self, memory: MemoryCacheConfig) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_disk(mut self, disk: DiskCacheConfig) -> Self {
        self.disk = disk;
        self
    }

    /// Reject configurations the loader cannot run with.
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.queue_capacity == 0 {
            return Err(LoaderError::InvalidConfig(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        if self.worker_count == 0 {
            return Err(LoaderError::InvalidConfig(
                "worker count must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(LoaderError::InvalidConfig(
                "request timeout must be greater than zero".to_string(),
            ));
        }
        if self.memory.max_size_bytes < MIN_MEMORY_BUDGET {
            return Err(LoaderError::InvalidConfig(format!(
                "memory cache size {} is smaller than one {}px tile ({} bytes)",
                self.memory.max_size_bytes, DEFAULT_TILE_SIZE, MIN_MEMORY_BUDGET
            )));
        }
        self.memory
            .validate()
            .and_then(|_| self.disk.validate())
            .map_err(|e| match e {
                CacheError::InvalidConfig(reason) => LoaderError::InvalidConfig(reason),
                other => LoaderError::Cache(other),
            })
    }
}

/// One worker per logical CPU.
pub fn default_worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKER_COUNT)
}
