//! Coordinate type definitions

use thiserror::Error;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Zoom range supported by the tile pyramid.
///
/// Capped at 30 so that tile indices (`2^zoom - 1`) still fit in an `i32`.
pub const MIN_ZOOM: u16 = 0;
pub const MAX_ZOOM: u16 = 30;

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    /// Latitude is outside valid range (-85.05112878 to 85.05112878)
    #[error("Invalid latitude: {0} (must be between {} and {})", MIN_LAT, MAX_LAT)]
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    #[error("Invalid longitude: {0} (must be between {} and {})", MIN_LON, MAX_LON)]
    InvalidLongitude(f64),
    /// Zoom level is outside valid range (0 to 30)
    #[error("Invalid zoom level: {0} (must be between {} and {})", MIN_ZOOM, MAX_ZOOM)]
    InvalidZoom(u16),
    /// Tile index does not exist at the given zoom level
    #[error("Tile ({x}, {y}) does not exist at zoom {zoom}")]
    InvalidTile { x: i32, y: i32, zoom: u16 },
}

/// Number of tiles along one axis at the given zoom level.
#[inline]
pub fn tiles_per_axis(zoom: u16) -> i64 {
    1_i64 << zoom.min(MAX_ZOOM)
}

/// Returns true if `(x, y)` addresses a tile that exists at `zoom`.
#[inline]
pub fn is_valid_tile(x: i32, y: i32, zoom: u16) -> bool {
    if zoom > MAX_ZOOM {
        return false;
    }
    let n = tiles_per_axis(zoom);
    (0..n).contains(&(x as i64)) && (0..n).contains(&(y as i64))
}
