//! Cache path construction and on-disk usage reporting.

use crate::tile::TileKey;
use std::io;
use std::path::{Path, PathBuf};

/// Extension of every tile stored by the disk tier.
pub const TILE_EXTENSION: &str = "png";

/// Construct the full path for a cached tile.
///
/// ```text
/// <cache_dir>/<provider>/<zoom>/<x>_<y>.png
/// ```
///
/// # Example
///
/// ```ignore
/// let path = tile_path(Path::new("/cache"), &key); // key: osm, zoom 15, (5279, 12754)
/// assert_eq!(path, PathBuf::from("/cache/osm/15/5279_12754.png"));
/// ```
pub fn tile_path(cache_dir: &Path, key: &TileKey) -> PathBuf {
    zoom_directory(cache_dir, key).join(format!(
        "{}_{}.{}",
        key.x(),
        key.y(),
        TILE_EXTENSION
    ))
}

/// Directory holding every tile of one provider at one zoom level.
pub fn zoom_directory(cache_dir: &Path, key: &TileKey) -> PathBuf {
    provider_directory(cache_dir, key.provider().id()).join(key.zoom().to_string())
}

/// Directory holding every tile of one provider.
pub fn provider_directory(cache_dir: &Path, provider: &str) -> PathBuf {
    cache_dir.join(provider)
}

/// Returns true if `path` names a tile file (as opposed to a partial write).
pub fn is_tile_file(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(TILE_EXTENSION)
}

/// On-disk usage of one provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderUsage {
    pub provider: String,
    pub files: u64,
    pub bytes: u64,
}

/// On-disk usage of a whole cache root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiskUsage {
    pub files: u64,
    pub bytes: u64,
    /// Per-provider breakdown, sorted by provider id
    pub providers: Vec<ProviderUsage>,
}

/// Walk a cache root and total the tile files under it.
///
/// A missing root reports zero usage.
pub fn disk_cache_stats(cache_dir: &Path) -> io::Result<DiskUsage> {
    let mut usage = DiskUsage::default();
    if !cache_dir.is_dir() {
        return Ok(usage);
    }

    for entry in std::fs::read_dir(cache_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let mut provider = ProviderUsage {
            provider: entry.file_name().to_string_lossy().into_owned(),
            ..Default::default()
        };
        total_tiles(&entry.path(), &mut provider.files, &mut provider.bytes)?;

        usage.files += provider.files;
        usage.bytes += provider.bytes;
        usage.providers.push(provider);
    }

    usage.providers.sort_by(|a, b| a.provider.cmp(&b.provider));
    Ok(usage)
}

fn total_tiles(dir: &Path, files: &mut u64, bytes: &mut u64) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            total_tiles(&path, files, bytes)?;
        } else if file_type.is_file() && is_tile_file(&path) {
            *files += 1;
            *bytes += entry.metadata()?.len();
        }
    }
    Ok(())
}
