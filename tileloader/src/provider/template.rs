//! URL-template tile provider
//!
//! Covers the common XYZ / TMS-style servers (OpenStreetMap, most WMTS
//! gateways) as well as quadkey-addressed servers such as Bing Maps.

use super::types::TileProvider;
use crate::coord::{is_valid_tile, tile_to_quadkey, Projection, WebMercator, MAX_ZOOM};
use crate::tile::TileKey;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Provider whose tile URLs are produced by substituting placeholders in a
/// template string.
///
/// Supported placeholders:
///
/// | Placeholder  | Replaced with                                      |
/// |--------------|----------------------------------------------------|
/// | `{x}`        | tile column                                        |
/// | `{y}`        | tile row                                           |
/// | `{z}`        | zoom level                                         |
/// | `{quadkey}`  | Bing-style quadkey of the tile                     |
/// | `{s}`        | subdomain, rotated by `(x + y) % subdomains.len()` |
/// | `{apikey}`   | API key given at construction (empty if none)      |
#[derive(Debug, Clone)]
pub struct UrlTemplateProvider {
    id: String,
    template: String,
    tile_size: u32,
    min_zoom: u16,
    max_zoom: u16,
    subdomains: Vec<String>,
    api_key: Option<String>,
    projection: WebMercator,
}

impl UrlTemplateProvider {
    /// Creates a provider with a 256px tile size and the full zoom range.
    pub fn new(id: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            template: template.into(),
            tile_size: DEFAULT_TILE_SIZE,
            min_zoom: 0,
            max_zoom: MAX_ZOOM,
            subdomains: Vec::new(),
            api_key: None,
            projection: WebMercator,
        }
    }

    /// OpenStreetMap standard tile layer.
    pub fn openstreetmap() -> Self {
        Self::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png").with_zoom_range(0, 19)
    }

    /// Bing Maps aerial imagery (quadkey addressed, four load-balanced hosts).
    pub fn bing_aerial() -> Self {
        Self::new(
            "bing",
            "https://ecn.t{s}.tiles.virtualearth.net/tiles/a{quadkey}.jpeg?g=1",
        )
        .with_zoom_range(1, 19)
        .with_subdomains(["0", "1", "2", "3"])
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Restricts the zoom levels the provider serves. Keys outside the range
    /// resolve to no URL.
    pub fn with_zoom_range(mut self, min_zoom: u16, max_zoom: u16) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom.min(MAX_ZOOM);
        self
    }

    pub fn with_subdomains<I, S>(mut self, subdomains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdomains = subdomains.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn supports_zoom(&self, zoom: u16) -> bool {
        (self.min_zoom..=self.max_zoom).contains(&zoom)
    }

    fn subdomain_for(&self, x: i32, y: i32) -> &str {
        if self.subdomains.is_empty() {
            return "";
        }
        let index = (x as i64 + y as i64).rem_euclid(self.subdomains.len() as i64) as usize;
        &self.subdomains[index]
    }
}

impl TileProvider for UrlTemplateProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn tile_url(&self, key: &TileKey) -> Option<String> {
        let (x, y, zoom) = (key.x(), key.y(), key.zoom());
        if !self.supports_zoom(zoom) || !is_valid_tile(x, y, zoom) {
            return None;
        }

        let mut url = self
            .template
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
            .replace("{z}", &zoom.to_string())
            .replace("{s}", self.subdomain_for(x, y))
            .replace("{apikey}", self.api_key.as_deref().unwrap_or(""));

        if url.contains("{quadkey}") {
            url = url.replace("{quadkey}", &tile_to_quadkey(x, y, zoom));
        }

        Some(url)
    }

    fn tile_size_px(&self) -> u32 {
        self.tile_size
    }

    fn projection(&self) -> &dyn Projection {
        &self.projection
    }
}
