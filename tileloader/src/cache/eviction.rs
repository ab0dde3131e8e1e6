//! LRU sweep helpers for the disk tier.
//!
//! Uses an LRU approximation based on file modification time (mtime). When
//! the tier exceeds its budget the oldest files are deleted until the tier
//! is at 90% of the budget, leaving headroom for new writes.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info};

use super::path::is_tile_file;

/// Target percentage of limit after eviction (0.9 = 90%).
pub const EVICTION_TARGET_PERCENTAGE: f64 = 0.9;

/// Result of an eviction run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionResult {
    /// Number of files deleted
    pub files_deleted: u64,
    /// Total bytes freed
    pub bytes_freed: u64,
    /// Tier size before eviction
    pub size_before: u64,
    /// Tier size after eviction
    pub size_after: u64,
    /// Duration of eviction in milliseconds
    pub duration_ms: u64,
}

/// A tile file considered for eviction.
#[derive(Debug, Clone)]
pub(crate) struct CachedFile {
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// Byte count the sweep aims for.
pub fn eviction_target(max_size_bytes: u64) -> u64 {
    (max_size_bytes as f64 * EVICTION_TARGET_PERCENTAGE) as u64
}

/// Every tile file under `cache_dir`, oldest first.
///
/// Unreadable directories are skipped; the sweep works with whatever it can
/// see.
pub(crate) fn collect_tile_files(cache_dir: &Path) -> Vec<CachedFile> {
    let mut files = Vec::new();
    let mut pending = vec![cache_dir.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug!(dir = %dir.display(), error = %e, "Skipping unreadable cache directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            let path = entry.path();
            if metadata.is_dir() {
                pending.push(path);
            } else if is_tile_file(&path) {
                files.push(CachedFile {
                    modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                    size: metadata.len(),
                    path,
                });
            }
        }
    }

    files.sort_by_key(|file| file.modified);
    files
}

/// Log the result of an eviction run.
pub(crate) fn log_eviction_result(result: &EvictionResult) {
    info!(
        deleted = result.files_deleted,
        freed = result.bytes_freed,
        before = result.size_before,
        after = result.size_after,
        elapsed_ms = result.duration_ms,
        "Disk cache swept"
    );
}
