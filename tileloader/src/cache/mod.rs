//! Two-tier tile cache.
//!
//! A byte-budgeted in-memory tier with sliding expiration in front of a
//! persistent on-disk tier. Both implement [`TileCache`] and report the
//! same [`CacheStatistics`].

mod disk;
mod eviction;
mod locks;
mod memory;
mod path;
mod stats;
mod r#trait;
mod types;

pub use disk::DiskCache;
pub use eviction::{EvictionResult, EVICTION_TARGET_PERCENTAGE};
pub use memory::MemoryCache;
pub use r#trait::{BoxFuture, TileCache};
pub use stats::CacheStatistics;
pub use types::{
    default_cache_dir, CacheError, DiskCacheConfig, MemoryCacheConfig, DEFAULT_DISK_SIZE,
    DEFAULT_MEMORY_IDLE, DEFAULT_MEMORY_SIZE,
};

// Re-export path utilities for convenience
pub use path::{
    disk_cache_stats, provider_directory, tile_path, zoom_directory, DiskUsage, ProviderUsage,
    TILE_EXTENSION,
};
