//! Persistent tile cache on the local filesystem.
//!
//! Tiles are stored as PNG files at `{root}/{provider}/{zoom}/{x}_{y}.png`
//! and survive restarts. Reads and writes of the same file are serialized
//! through a keyed lock table; different tiles proceed in parallel.

use crate::cache::eviction::{
    collect_tile_files, eviction_target, log_eviction_result, EvictionResult,
};
use crate::cache::locks::KeyedLocks;
use crate::cache::path::{tile_path, zoom_directory};
use crate::cache::r#trait::{BoxFuture, TileCache};
use crate::cache::types::{CacheError, DiskCacheConfig};
use crate::cache::CacheStatistics;
use crate::tile::{TileImage, TileKey};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Instant, SystemTime};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Disk tier of the tile cache.
///
/// `size_bytes` and `entry_count` start from a scan of the root at
/// construction and are then maintained incrementally. The byte budget is
/// advisory unless `enforce_limit` is set, in which case an LRU sweep
/// (by file mtime) brings the tier back to 90% of the budget at startup and
/// whenever a write pushes it over.
pub struct DiskCache {
    cache_dir: PathBuf,
    max_size_bytes: u64,
    enforce_limit: bool,
    /// Per-file locks
    locks: KeyedLocks<PathBuf>,
    /// Guards directory creation
    dir_lock: Mutex<()>,
    size_bytes: AtomicU64,
    entry_count: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    sweeping: AtomicBool,
}

impl DiskCache {
    /// Open (creating if necessary) the cache root and scan existing tiles.
    pub fn new(config: &DiskCacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        std::fs::create_dir_all(&config.cache_dir)?;

        let files = collect_tile_files(&config.cache_dir);
        let total_size: u64 = files.iter().map(|file| file.size).sum();

        info!(
            cache_dir = %config.cache_dir.display(),
            entries = files.len(),
            size_bytes = total_size,
            max_size_bytes = config.max_size_bytes,
            enforce_limit = config.enforce_limit,
            "Disk cache opened"
        );

        let cache = Self {
            cache_dir: config.cache_dir.clone(),
            max_size_bytes: config.max_size_bytes,
            enforce_limit: config.enforce_limit,
            locks: KeyedLocks::new(),
            dir_lock: Mutex::new(()),
            size_bytes: AtomicU64::new(total_size),
            entry_count: AtomicU64::new(files.len() as u64),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            sweeping: AtomicBool::new(false),
        };

        // Nobody else can see the cache yet, so the startup sweep runs
        // without taking file locks.
        if cache.enforce_limit && total_size > cache.max_size_bytes {
            let start = Instant::now();
            let target = eviction_target(cache.max_size_bytes);
            let mut result = EvictionResult {
                size_before: total_size,
                ..Default::default()
            };

            for file in files {
                if cache.size_bytes() <= target {
                    break;
                }
                match std::fs::remove_file(&file.path) {
                    Ok(()) => {
                        cache.forget_entry(file.size);
                        result.files_deleted += 1;
                        result.bytes_freed += file.size;
                    }
                    Err(e) => debug!(
                        path = %file.path.display(),
                        error = %e,
                        "Failed to delete cache file during eviction"
                    ),
                }
            }

            result.size_after = cache.size_bytes();
            result.duration_ms = start.elapsed().as_millis() as u64;
            cache
                .evictions
                .fetch_add(result.files_deleted, Ordering::Relaxed);
            log_eviction_result(&result);
        }

        Ok(cache)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn max_size_bytes(&self) -> u64 {
        self.max_size_bytes
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes.load(Ordering::Relaxed)
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count.load(Ordering::Relaxed)
    }

    /// Files removed by LRU sweeps since the cache was opened.
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Returns true if a file for `key` exists, without counting a hit or
    /// miss.
    pub async fn contains(&self, key: &TileKey) -> bool {
        tokio::fs::try_exists(tile_path(&self.cache_dir, key))
            .await
            .unwrap_or(false)
    }

    /// Read and decode the tile for `key`.
    ///
    /// A file that no longer decodes is deleted and reported as a miss so
    /// the tile is downloaded again.
    pub async fn get(&self, key: &TileKey) -> Result<Option<TileImage>, CacheError> {
        let path = tile_path(&self.cache_dir, key);
        let _guard = self.locks.lock(&path).await;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                return Ok(None);
            }
            Err(e) => return Err(CacheError::Io(e)),
        };

        match TileImage::decode(&bytes) {
            Ok(image) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                if self.enforce_limit {
                    touch(&path);
                }
                Ok(Some(image))
            }
            Err(e) => {
                warn!(
                    tile = %key,
                    path = %path.display(),
                    error = %e,
                    "Discarding undecodable cache file"
                );
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => self.forget_entry(bytes.len() as u64),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => return Err(CacheError::Io(e)),
                }
                self.misses.fetch_add(1, Ordering::Relaxed);
                Ok(None)
            }
        }
    }

    /// Write (or overwrite) the tile for `key`, or delete it when `image` is
    /// `None`.
    pub async fn set(&self, key: &TileKey, image: Option<&TileImage>) -> Result<(), CacheError> {
        match image {
            Some(image) => self.write(key, image).await?,
            None => self.remove(key).await?,
        }

        if self.enforce_limit && self.size_bytes() > self.max_size_bytes {
            if let Some(result) = self.evict_if_over_limit().await? {
                log_eviction_result(&result);
            }
        }
        Ok(())
    }

    async fn write(&self, key: &TileKey, image: &TileImage) -> Result<(), CacheError> {
        let encoded = image.encode_png()?;
        let new_size = encoded.len() as u64;

        self.ensure_directory(&zoom_directory(&self.cache_dir, key))
            .await?;

        let path = tile_path(&self.cache_dir, key);
        let _guard = self.locks.lock(&path).await;

        let old_size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => Some(metadata.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(CacheError::Io(e)),
        };

        // Write atomically via temp file
        let temp_path = path.with_extension("tmp");
        tokio::fs::write(&temp_path, &encoded).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(CacheError::Io(e));
        }

        match old_size {
            Some(old) => {
                self.size_bytes.fetch_add(new_size, Ordering::Relaxed);
                self.size_bytes.fetch_sub(old, Ordering::Relaxed);
            }
            None => {
                self.size_bytes.fetch_add(new_size, Ordering::Relaxed);
                self.entry_count.fetch_add(1, Ordering::Relaxed);
            }
        }

        debug!(tile = %key, bytes = new_size, "Wrote tile to disk cache");
        Ok(())
    }

    async fn remove(&self, key: &TileKey) -> Result<(), CacheError> {
        let path = tile_path(&self.cache_dir, key);
        let _guard = self.locks.lock(&path).await;

        let size = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata.len(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(CacheError::Io(e)),
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.forget_entry(size);
                debug!(tile = %key, "Removed tile from disk cache");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CacheError::Io(e)),
        }
    }

    /// Create a provider/zoom directory on first use.
    ///
    /// The unlocked check keeps the common case cheap; the check is repeated
    /// under the lock so concurrent first writers create it once.
    async fn ensure_directory(&self, dir: &Path) -> Result<(), CacheError> {
        if tokio::fs::try_exists(dir).await? {
            return Ok(());
        }

        let _guard = self.dir_lock.lock().await;
        if !tokio::fs::try_exists(dir).await? {
            tokio::fs::create_dir_all(dir).await?;
            debug!(dir = %dir.display(), "Created cache directory");
        }
        Ok(())
    }

    /// Delete the least recently used files until the tier is at 90% of its
    /// budget.
    ///
    /// Returns `None` when the tier is within budget or another sweep is
    /// already running.
    pub async fn evict_if_over_limit(&self) -> Result<Option<EvictionResult>, CacheError> {
        let size_before = self.size_bytes();
        if size_before <= self.max_size_bytes {
            return Ok(None);
        }
        if self.sweeping.swap(true, Ordering::AcqRel) {
            return Ok(None);
        }

        let result = self.sweep(size_before).await;
        self.sweeping.store(false, Ordering::Release);
        result.map(Some)
    }

    async fn sweep(&self, size_before: u64) -> Result<EvictionResult, CacheError> {
        let start = Instant::now();
        let target = eviction_target(self.max_size_bytes);

        info!(
            size_bytes = size_before,
            limit_bytes = self.max_size_bytes,
            target_bytes = target,
            "Disk cache over limit, starting eviction"
        );

        let root = self.cache_dir.clone();
        let files = tokio::task::spawn_blocking(move || collect_tile_files(&root))
            .await
            .map_err(|e| CacheError::Io(io::Error::other(e.to_string())))?;

        let mut result = EvictionResult {
            size_before,
            ..Default::default()
        };

        for file in files {
            if self.size_bytes() <= target {
                break;
            }

            let _guard = self.locks.lock(&file.path).await;
            // Re-read: the file may have been rewritten or removed since the scan
            let size = match tokio::fs::metadata(&file.path).await {
                Ok(metadata) => metadata.len(),
                Err(_) => continue,
            };
            match tokio::fs::remove_file(&file.path).await {
                Ok(()) => {
                    self.forget_entry(size);
                    result.files_deleted += 1;
                    result.bytes_freed += size;
                }
                Err(e) => debug!(
                    path = %file.path.display(),
                    error = %e,
                    "Failed to delete cache file during eviction"
                ),
            }
        }

        if self.size_bytes() > target {
            warn!(
                size_bytes = self.size_bytes(),
                target_bytes = target,
                "Eviction could not reach target size"
            );
        }

        self.evictions
            .fetch_add(result.files_deleted, Ordering::Relaxed);
        result.size_after = self.size_bytes();
        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    /// Delete every cached tile.
    ///
    /// Intended for maintenance while no loader is writing to the root.
    pub async fn clear(&self) -> Result<EvictionResult, CacheError> {
        let start = Instant::now();
        let _guard = self.dir_lock.lock().await;

        let result = EvictionResult {
            files_deleted: self.entry_count(),
            bytes_freed: self.size_bytes(),
            size_before: self.size_bytes(),
            size_after: 0,
            duration_ms: 0,
        };

        let mut entries = tokio::fs::read_dir(&self.cache_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                tokio::fs::remove_dir_all(entry.path()).await?;
            }
        }

        self.size_bytes.store(0, Ordering::Relaxed);
        self.entry_count.store(0, Ordering::Relaxed);

        info!(
            cache_dir = %self.cache_dir.display(),
            files_deleted = result.files_deleted,
            bytes_freed = result.bytes_freed,
            "Disk cache cleared"
        );

        Ok(EvictionResult {
            duration_ms: start.elapsed().as_millis() as u64,
            ..result
        })
    }

    pub fn statistics(&self) -> CacheStatistics {
        CacheStatistics {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count: self.entry_count(),
            size_bytes: self.size_bytes(),
            capacity_bytes: self.max_size_bytes,
        }
    }

    fn forget_entry(&self, size: u64) {
        let _ = self
            .size_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(size))
            });
        let _ = self
            .entry_count
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(1))
            });
    }
}

/// Mark a file as recently used for the LRU sweep.
fn touch(path: &Path) {
    let result = std::fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(SystemTime::now()));
    if let Err(e) = result {
        debug!(path = %path.display(), error = %e, "Failed to update cache file mtime");
    }
}

impl TileCache for DiskCache {
    fn get<'a>(&'a self, key: &'a TileKey) -> BoxFuture<'a, Result<Option<TileImage>, CacheError>> {
        Box::pin(DiskCache::get(self, key))
    }

    fn set<'a>(
        &'a self,
        key: &'a TileKey,
        image: Option<TileImage>,
    ) -> BoxFuture<'a, Result<(), CacheError>> {
        Box::pin(async move { DiskCache::set(self, key, image.as_ref()).await })
    }

    fn statistics(&self) -> CacheStatistics {
        DiskCache::statistics(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LocalProvider, ProviderRef};
    use image::{Rgba, RgbaImage};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn key(x: i32, y: i32) -> TileKey {
        TileKey::new(x, y, 12, ProviderRef::new(LocalProvider::new("test", 32)))
    }

    fn image(shade: u8) -> TileImage {
        TileImage::new(RgbaImage::from_pixel(32, 32, Rgba([shade, shade, shade, 255])))
    }

    fn open(dir: &Path) -> DiskCache {
        DiskCache::new(&DiskCacheConfig::new(dir)).unwrap()
    }

    fn open_limited(dir: &Path, max_size_bytes: u64) -> DiskCache {
        DiskCache::new(&DiskCacheConfig {
            cache_dir: dir.to_path_buf(),
            max_size_bytes,
            enforce_limit: true,
        })
        .unwrap()
    }

    /// Encoded size of `image(7)`, the shade used wherever sizes are asserted.
    fn png_size() -> u64 {
        image(7).encode_png().unwrap().len() as u64
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());
        let original = image(7);

        cache.set(&key(3, 4), Some(&original)).await.unwrap();

        assert!(temp_dir.path().join("test/12/3_4.png").exists());
        assert!(cache.contains(&key(3, 4)).await);
        let loaded = cache.get(&key(3, 4)).await.unwrap().unwrap();
        assert_eq!(loaded.pixels(), original.pixels());

        let stats = cache.statistics();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.size_bytes, png_size());
    }

    #[tokio::test]
    async fn test_get_missing_counts_miss() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());

        assert!(cache.get(&key(0, 0)).await.unwrap().is_none());
        assert_eq!(cache.statistics().misses, 1);
        assert_eq!(cache.statistics().hits, 0);
    }

    #[tokio::test]
    async fn test_set_none_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());

        cache.set(&key(1, 1), Some(&image(1))).await.unwrap();
        cache.set(&key(1, 1), None).await.unwrap();

        assert!(!temp_dir.path().join("test/12/1_1.png").exists());
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);

        // Removing an absent tile is fine
        cache.set(&key(1, 1), None).await.unwrap();
    }

    #[tokio::test]
    async fn test_overwrite_keeps_single_entry() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());

        cache.set(&key(1, 1), Some(&image(1))).await.unwrap();
        cache.set(&key(1, 1), Some(&image(2))).await.unwrap();

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(
            cache.size_bytes(),
            image(2).encode_png().unwrap().len() as u64
        );
        let loaded = cache.get(&key(1, 1)).await.unwrap().unwrap();
        assert_eq!(loaded.pixels().get_pixel(0, 0).0, [2, 2, 2, 255]);
    }

    #[tokio::test]
    async fn test_reopen_scans_existing_tiles() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = open(temp_dir.path());
            for x in 0..3 {
                cache.set(&key(x, 0), Some(&image(7))).await.unwrap();
            }
        }

        let reopened = open(temp_dir.path());
        assert_eq!(reopened.entry_count(), 3);
        assert_eq!(reopened.size_bytes(), 3 * png_size());
        assert!(reopened.get(&key(2, 0)).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("test/12/5_5.png");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"garbage").unwrap();

        let cache = open(temp_dir.path());
        assert_eq!(cache.entry_count(), 1);

        assert!(cache.get(&key(5, 5)).await.unwrap().is_none());
        assert!(!path.exists());
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.statistics().misses, 1);
    }

    #[tokio::test]
    async fn test_advisory_budget_never_evicts() {
        let temp_dir = TempDir::new().unwrap();
        let cache = DiskCache::new(&DiskCacheConfig {
            cache_dir: temp_dir.path().to_path_buf(),
            max_size_bytes: png_size(),
            enforce_limit: false,
        })
        .unwrap();

        for x in 0..4 {
            cache.set(&key(x, 0), Some(&image(7))).await.unwrap();
        }

        assert_eq!(cache.entry_count(), 4);
        assert_eq!(cache.evictions(), 0);
    }

    #[tokio::test]
    async fn test_enforced_budget_sweeps_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open_limited(temp_dir.path(), 3 * png_size());

        for x in 0..5 {
            cache.set(&key(x, 0), Some(&image(7))).await.unwrap();
        }

        let stats = cache.statistics();
        assert!(stats.size_bytes <= 3 * png_size());
        assert!(stats.entry_count < 5);
        assert!(cache.evictions() >= 2);
        assert_eq!(
            collect_tile_files(temp_dir.path()).len() as u64,
            stats.entry_count
        );
    }

    #[tokio::test]
    async fn test_startup_sweep_when_over_budget() {
        let temp_dir = TempDir::new().unwrap();
        {
            let cache = open(temp_dir.path());
            for x in 0..10 {
                cache.set(&key(x, 0), Some(&image(7))).await.unwrap();
            }
        }

        let cache = open_limited(temp_dir.path(), 5 * png_size());
        assert!(cache.size_bytes() <= eviction_target(5 * png_size()));
        assert_eq!(cache.evictions(), 10 - cache.entry_count());
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());

        for x in 0..3 {
            cache.set(&key(x, 0), Some(&image(1))).await.unwrap();
        }
        let result = cache.clear().await.unwrap();

        assert_eq!(result.files_deleted, 3);
        assert_eq!(cache.entry_count(), 0);
        assert_eq!(cache.size_bytes(), 0);
        assert!(!temp_dir.path().join("test").exists());
        assert!(temp_dir.path().exists());

        // Directories are recreated on demand
        cache.set(&key(0, 0), Some(&image(1))).await.unwrap();
        assert_eq!(cache.entry_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_writes_share_directory() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(open(temp_dir.path()));

        let mut handles = Vec::new();
        for x in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set(&key(x, 7), Some(&image(7))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.entry_count(), 16);
        assert_eq!(cache.size_bytes(), 16 * png_size());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writes_same_key_count_once() {
        let temp_dir = TempDir::new().unwrap();
        let cache = Arc::new(open(temp_dir.path()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.set(&key(9, 9), Some(&image(7))).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(cache.entry_count(), 1);
        assert_eq!(cache.size_bytes(), png_size());
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let result = DiskCache::new(&DiskCacheConfig::new(""));
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_usable_through_trait_object() {
        let temp_dir = TempDir::new().unwrap();
        let cache = open(temp_dir.path());
        let tier: &dyn TileCache = &cache;

        tier.set(&key(2, 2), Some(image(5))).await.unwrap();
        assert!(tier.get(&key(2, 2)).await.unwrap().is_some());
        assert_eq!(tier.statistics().entry_count, 1);
    }
}
