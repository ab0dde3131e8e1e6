//! Coordinate conversion module
//!
//! Provides the [`Projection`] capability used by tile providers to map
//! geographic coordinates (latitude/longitude) onto tile indices, plus the
//! standard Web Mercator / Slippy Map implementation and quadkey encoding.

mod types;

pub use types::{
    is_valid_tile, tiles_per_axis, CoordError, MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON,
    MIN_ZOOM,
};

use std::f64::consts::PI;

/// Geographic projection used by a tile provider.
///
/// Providers expose their projection so callers can work out which tile
/// indices cover a point or region of interest.
pub trait Projection: Send + Sync {
    /// Short identifier for logging (e.g. "EPSG:3857").
    fn name(&self) -> &str;

    /// Converts a geographic position to the `(x, y)` index of the tile
    /// containing it.
    fn lat_lon_to_tile(&self, lat: f64, lon: f64, zoom: u16) -> Result<(i32, i32), CoordError>;

    /// Returns the latitude/longitude of the tile's northwest corner.
    fn tile_to_lat_lon(&self, x: i32, y: i32, zoom: u16) -> (f64, f64);
}

/// Spherical Web Mercator (EPSG:3857), the projection used by OpenStreetMap,
/// Bing, Google and most XYZ tile servers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WebMercator;

impl Projection for WebMercator {
    fn name(&self) -> &str {
        "EPSG:3857"
    }

    #[inline]
    fn lat_lon_to_tile(&self, lat: f64, lon: f64, zoom: u16) -> Result<(i32, i32), CoordError> {
        if !(MIN_LAT..=MAX_LAT).contains(&lat) {
            return Err(CoordError::InvalidLatitude(lat));
        }
        if !(MIN_LON..=MAX_LON).contains(&lon) {
            return Err(CoordError::InvalidLongitude(lon));
        }
        if zoom > MAX_ZOOM {
            return Err(CoordError::InvalidZoom(zoom));
        }

        let n = tiles_per_axis(zoom) as f64;
        let max_index = n - 1.0;

        let x = ((lon + 180.0) / 360.0 * n).floor().min(max_index);

        let lat_rad = lat * PI / 180.0;
        let y = ((1.0 - lat_rad.tan().asinh() / PI) / 2.0 * n)
            .floor()
            .clamp(0.0, max_index);

        Ok((x as i32, y as i32))
    }

    #[inline]
    fn tile_to_lat_lon(&self, x: i32, y: i32, zoom: u16) -> (f64, f64) {
        let n = tiles_per_axis(zoom) as f64;

        let lon = x as f64 / n * 360.0 - 180.0;

        let y = y as f64 / n;
        let lat_rad = (PI * (1.0 - 2.0 * y)).sinh().atan();
        let lat = lat_rad * 180.0 / PI;

        (lat, lon)
    }
}

/// Encodes a tile index as a Bing Maps quadkey.
///
/// Zoom 0 encodes to the empty string.
pub fn tile_to_quadkey(x: i32, y: i32, zoom: u16) -> String {
    let mut quadkey = String::with_capacity(zoom as usize);
    for level in (1..=zoom).rev() {
        let mask = 1_i64 << (level - 1);
        let mut digit = b'0';
        if (x as i64) & mask != 0 {
            digit += 1;
        }
        if (y as i64) & mask != 0 {
            digit += 2;
        }
        quadkey.push(digit as char);
    }
    quadkey
}

/// Enumerates tile indices in a square of `radius` tiles around the tile
/// containing `(lat, lon)`, clipped to the valid range of the zoom level.
///
/// Indices are returned ring by ring, centre tile first, so callers that
/// request them in order load the middle of the view before its edges.
pub fn tiles_around(
    projection: &dyn Projection,
    lat: f64,
    lon: f64,
    zoom: u16,
    radius: u32,
) -> Result<Vec<(i32, i32)>, CoordError> {
    let (cx, cy) = projection.lat_lon_to_tile(lat, lon, zoom)?;
    let radius = radius as i32;

    let mut tiles = Vec::new();
    for ring in 0..=radius {
        for dy in -ring..=ring {
            for dx in -ring..=ring {
                if dx.abs() != ring && dy.abs() != ring {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if is_valid_tile(x, y, zoom) {
                    tiles.push((x, y));
                }
            }
        }
    }
    Ok(tiles)
}

/// Enumerates tile indices covering the rectangle between two corners.
///
/// Corners may be given in either order. Rows are returned north to south.
pub fn tiles_in_bounds(
    projection: &dyn Projection,
    (lat_a, lon_a): (f64, f64),
    (lat_b, lon_b): (f64, f64),
    zoom: u16,
) -> Result<Vec<(i32, i32)>, CoordError> {
    let (xa, ya) = projection.lat_lon_to_tile(lat_a, lon_a, zoom)?;
    let (xb, yb) = projection.lat_lon_to_tile(lat_b, lon_b, zoom)?;

    let (min_x, max_x) = (xa.min(xb), xa.max(xb));
    let (min_y, max_y) = (ya.min(yb), ya.max(yb));

    let mut tiles = Vec::with_capacity(((max_x - min_x + 1) * (max_y - min_y + 1)) as usize);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            tiles.push((x, y));
        }
    }
    Ok(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_york_city_at_zoom_16() {
        let (x, y) = WebMercator.lat_lon_to_tile(40.7128, -74.0060, 16).unwrap();
        assert_eq!(x, 19295);
        assert_eq!(y, 24640);
    }

    #[test]
    fn test_invalid_latitude() {
        let result = WebMercator.lat_lon_to_tile(90.0, 0.0, 10);
        assert!(matches!(result, Err(CoordError::InvalidLatitude(_))));
    }

    #[test]
    fn test_invalid_zoom() {
        let result = WebMercator.lat_lon_to_tile(0.0, 0.0, 31);
        assert!(matches!(result, Err(CoordError::InvalidZoom(31))));
    }

    #[test]
    fn test_antimeridian_is_clamped_to_last_column() {
        let (x, _) = WebMercator.lat_lon_to_tile(0.0, 180.0, 3).unwrap();
        assert_eq!(x, 7);
    }

    #[test]
    fn test_tile_to_lat_lon_at_equator() {
        let (lat, lon) = WebMercator.tile_to_lat_lon(512, 512, 10);
        assert!(lat.abs() < 1.0, "Should be near equator");
        assert!(lon.abs() < 1.0, "Should be near prime meridian");
    }

    #[test]
    fn test_roundtrip_at_different_zooms() {
        let lat = 51.5074;
        let lon = -0.1278;

        for zoom in [0, 5, 10, 15, 18] {
            let (x, y) = WebMercator.lat_lon_to_tile(lat, lon, zoom).unwrap();
            let (converted_lat, converted_lon) = WebMercator.tile_to_lat_lon(x, y, zoom);

            // Northwest corner is at most one tile away
            let tile_size_degrees = 360.0 / (2.0_f64.powi(zoom as i32));
            assert!((converted_lat - lat).abs() < tile_size_degrees);
            assert!((converted_lon - lon).abs() < tile_size_degrees);
        }
    }

    #[test]
    fn test_quadkey_known_values() {
        // Example from the Bing Maps tile system documentation
        assert_eq!(tile_to_quadkey(3, 5, 3), "213");
        assert_eq!(tile_to_quadkey(0, 0, 1), "0");
        assert_eq!(tile_to_quadkey(1, 1, 1), "3");
        assert_eq!(tile_to_quadkey(0, 0, 0), "");
    }

    #[test]
    fn test_tiles_around_centre_first() {
        let tiles = tiles_around(&WebMercator, 0.0, 0.0, 4, 1).unwrap();
        let centre = WebMercator.lat_lon_to_tile(0.0, 0.0, 4).unwrap();

        assert_eq!(tiles.len(), 9);
        assert_eq!(tiles[0], centre);
    }

    #[test]
    fn test_tiles_around_clips_at_world_edge() {
        // Top-left corner of the world at zoom 2: only a 2x2 block survives
        let tiles = tiles_around(&WebMercator, MAX_LAT, MIN_LON, 2, 1).unwrap();
        assert_eq!(tiles.len(), 4);
        assert!(tiles.iter().all(|&(x, y)| is_valid_tile(x, y, 2)));
    }

    #[test]
    fn test_tiles_in_bounds_corner_order_is_irrelevant() {
        let a = tiles_in_bounds(&WebMercator, (10.0, -10.0), (-10.0, 10.0), 4).unwrap();
        let b = tiles_in_bounds(&WebMercator, (-10.0, 10.0), (10.0, -10.0), 4).unwrap();
        assert_eq!(a, b);
        // 20 degrees spans two columns and two rows around the origin at z4
        assert_eq!(a.len(), 4);
        assert_eq!(a[0], (7, 7));
    }

    #[test]
    fn test_tiles_in_bounds_rejects_invalid_corner() {
        let result = tiles_in_bounds(&WebMercator, (0.0, 0.0), (0.0, 200.0), 4);
        assert!(matches!(result, Err(CoordError::InvalidLongitude(_))));
    }

    #[test]
    fn test_projection_is_object_safe() {
        let projection: Box<dyn Projection> = Box::new(WebMercator);
        assert_eq!(projection.name(), "EPSG:3857");
    }
}
