//! Tile identity

use crate::provider::ProviderRef;
use std::fmt;

/// Identifies one tile of one provider.
///
/// Equality and hashing cover all four fields; the provider is compared by
/// its stable id, so keys built from separately constructed handles to the
/// same source still collide in the caches.
///
/// # Example
///
/// ```ignore
/// use tileloader::provider::{LocalProvider, ProviderRef};
/// use tileloader::tile::TileKey;
///
/// let key = TileKey::new(3, 5, 4, ProviderRef::new(LocalProvider::new("blank", 256)));
/// assert_eq!(key.to_string(), "blank/4/3_5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Tile column
    x: i32,
    /// Tile row
    y: i32,
    /// Zoom level
    zoom: u16,
    provider: ProviderRef,
}

impl TileKey {
    pub fn new(x: i32, y: i32, zoom: u16, provider: ProviderRef) -> Self {
        Self {
            x,
            y,
            zoom,
            provider,
        }
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn zoom(&self) -> u16 {
        self.zoom
    }

    pub fn provider(&self) -> &ProviderRef {
        &self.provider
    }

    /// Resolves the download URL through the key's provider.
    pub fn url(&self) -> Option<String> {
        self.provider.tile_url(self)
    }

    /// Edge length of the tile in pixels, as reported by the provider.
    pub fn tile_size_px(&self) -> u32 {
        self.provider.tile_size_px()
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}_{}", self.provider, self.zoom, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{LocalProvider, UrlTemplateProvider};
    use std::collections::HashSet;

    fn blank() -> ProviderRef {
        ProviderRef::new(LocalProvider::new("blank", 256))
    }

    #[test]
    fn test_key_equality_covers_all_fields() {
        let a = TileKey::new(1, 2, 3, blank());
        assert_eq!(a, TileKey::new(1, 2, 3, blank()));
        assert_ne!(a, TileKey::new(2, 2, 3, blank()));
        assert_ne!(a, TileKey::new(1, 3, 3, blank()));
        assert_ne!(a, TileKey::new(1, 2, 4, blank()));
        assert_ne!(
            a,
            TileKey::new(1, 2, 3, ProviderRef::new(LocalProvider::new("other", 256)))
        );
    }

    #[test]
    fn test_key_hash_consistent_with_equality() {
        let mut set = HashSet::new();
        set.insert(TileKey::new(1, 2, 3, blank()));
        set.insert(TileKey::new(1, 2, 3, blank()));
        set.insert(TileKey::new(1, 2, 4, blank()));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_key_display() {
        let key = TileKey::new(3, 5, 4, blank());
        assert_eq!(key.to_string(), "blank/4/3_5");
    }

    #[test]
    fn test_key_url_delegates_to_provider() {
        let osm = ProviderRef::new(UrlTemplateProvider::openstreetmap());
        let key = TileKey::new(1, 1, 1, osm);
        assert_eq!(
            key.url().as_deref(),
            Some("https://tile.openstreetmap.org/1/1/1.png")
        );
        assert_eq!(key.tile_size_px(), 256);

        assert!(TileKey::new(0, 0, 0, blank()).url().is_none());
    }
}
