//! In-memory tile cache.
//!
//! Backed by `moka`: entries are weighed by their estimated byte size,
//! expire after a sliding idle timeout and are evicted under budget
//! pressure. Every removal, whatever the cause, runs the image's release
//! contract through the eviction listener.

use crate::cache::r#trait::{BoxFuture, TileCache};
use crate::cache::types::{CacheError, MemoryCacheConfig};
use crate::cache::CacheStatistics;
use crate::tile::{TileImage, TileKey};
use moka::notification::RemovalCause;
use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// In-memory cache of decoded tiles.
///
/// The authoritative answer to "is this tile ready". Safe to call from the
/// render thread: `get` and `set` never perform I/O.
pub struct MemoryCache {
    cache: Cache<TileKey, TileImage>,
    max_size_bytes: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
}

impl MemoryCache {
    pub fn new(config: &MemoryCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;

        let evictions = Arc::new(AtomicU64::new(0));
        let listener_evictions = Arc::clone(&evictions);

        let cache = Cache::builder()
            .weigher(|_key: &TileKey, image: &TileImage| -> u32 {
                image.byte_size().min(u32::MAX as u64) as u32
            })
            .max_capacity(config.max_size_bytes)
            .time_to_idle(config.idle_timeout)
            .eviction_listener(move |key: Arc<TileKey>, image: TileImage, cause: RemovalCause| {
                if cause.was_evicted() {
                    listener_evictions.fetch_add(1, Ordering::Relaxed);
                }
                if image.release() {
                    trace!(tile = %key, cause = ?cause, "Released memory tile");
                }
            })
            .build();

        Ok(Self {
            cache,
            max_size_bytes: config.max_size_bytes,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions,
        })
    }

    /// Get a tile, resetting its idle timer on a hit.
    pub fn get(&self, key: &TileKey) -> Option<TileImage> {
        match self.cache.get(key) {
            Some(image) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(image)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Check presence without touching counters or the idle timer.
    pub fn contains(&self, key: &TileKey) -> bool {
        self.cache.contains_key(key)
    }

    /// Insert, replace or (with `None`) remove the entry for `key`.
    ///
    /// Replacing an entry releases the previous image. Storing the image
    /// that is already cached is a no-op, so it is never released by its
    /// own replacement.
    pub fn set(&self, key: &TileKey, image: Option<TileImage>) {
        match image {
            Some(image) => {
                if let Some(existing) = self.cache.get(key) {
                    if TileImage::ptr_eq(&existing, &image) {
                        return;
                    }
                }
                self.cache.insert(key.clone(), image);
            }
            None => self.cache.invalidate(key),
        }
    }

    /// Remove every entry, releasing each image.
    pub fn clear(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks();
    }

    /// Apply pending evictions and expirations now.
    ///
    /// moka performs maintenance lazily; tests and shutdown call this to
    /// observe evictions deterministically.
    pub fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks();
    }

    /// Number of entries removed by budget pressure or expiration.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn statistics(&self) -> CacheStatistics {
        self.cache.run_pending_tasks();
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.cache.entry_count(),
            size_bytes: self.cache.weighted_size(),
            capacity_bytes: self.max_size_bytes,
        }
    }
}

impl Drop for MemoryCache {
    // The eviction listener is not notified when the cache itself is dropped.
    fn drop(&mut self) {
        self.clear();
    }
}

impl TileCache for MemoryCache {
    fn get<'a>(&'a self, key: &'a TileKey) -> BoxFuture<'a, Result<Option<TileImage>, CacheError>> {
        Box::pin(async move { Ok(MemoryCache::get(self, key)) })
    }

    fn set<'a>(
        &'a self,
        key: &'a TileKey,
        image: Option<TileImage>,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move {
            MemoryCache::set(self, key, image);
            Ok(())
        })
    }

    fn statistics(&self) -> CacheStatistics {
        MemoryCache::statistics(self)
    }
}
