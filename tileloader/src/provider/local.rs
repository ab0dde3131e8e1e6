//! Offline provider

use super::types::TileProvider;
use crate::coord::{Projection, WebMercator};
use crate::tile::TileKey;

/// Provider with no remote source.
///
/// Every key resolves to the configured empty-tile fill, which the loader
/// writes through to both cache tiers like any downloaded tile.
#[derive(Debug, Clone)]
pub struct LocalProvider {
    id: String,
    tile_size: u32,
    projection: WebMercator,
}

impl LocalProvider {
    pub fn new(id: impl Into<String>, tile_size: u32) -> Self {
        Self {
            id: id.into(),
            tile_size,
            projection: WebMercator,
        }
    }
}

impl TileProvider for LocalProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn tile_url(&self, _key: &TileKey) -> Option<String> {
        None
    }

    fn tile_size_px(&self) -> u32 {
        self.tile_size
    }

    fn projection(&self) -> &dyn Projection {
        &self.projection
    }
}
