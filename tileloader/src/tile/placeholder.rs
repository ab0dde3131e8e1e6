//! Placeholder tiles
//!
//! Served by `lookup` while the real tile is still loading, and used as the
//! resolved image for providers that have no remote source.

use super::TileImage;
use dashmap::DashMap;
use image::{Rgba, RgbaImage};
use std::fmt;
use std::str::FromStr;

/// Default fill: light grey, fully opaque.
pub const DEFAULT_FILL_COLOR: [u8; 4] = [0xE0, 0xE0, 0xE0, 0xFF];

/// How empty tiles are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FillStyle {
    /// Single RGBA colour
    Solid([u8; 4]),
    /// Two-colour checkerboard with square cells of `cell_px` pixels
    Checker {
        light: [u8; 4],
        dark: [u8; 4],
        cell_px: u32,
    },
}

impl FillStyle {
    /// Checkerboard with the default light/dark greys and 16px cells.
    pub fn checker() -> Self {
        FillStyle::Checker {
            light: DEFAULT_FILL_COLOR,
            dark: [0xC8, 0xC8, 0xC8, 0xFF],
            cell_px: 16,
        }
    }

    /// Paints a `size` x `size` bitmap in this style.
    pub fn render(&self, size: u32) -> RgbaImage {
        match *self {
            FillStyle::Solid(rgba) => RgbaImage::from_pixel(size, size, Rgba(rgba)),
            FillStyle::Checker {
                light,
                dark,
                cell_px,
            } => {
                let cell = cell_px.max(1);
                RgbaImage::from_fn(size, size, |x, y| {
                    if (x / cell + y / cell) % 2 == 0 {
                        Rgba(light)
                    } else {
                        Rgba(dark)
                    }
                })
            }
        }
    }
}

impl Default for FillStyle {
    fn default() -> Self {
        FillStyle::Solid(DEFAULT_FILL_COLOR)
    }
}

impl fmt::Display for FillStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FillStyle::Solid([r, g, b, a]) => {
                write!(f, "#{:02x}{:02x}{:02x}{:02x}", r, g, b, a)
            }
            FillStyle::Checker { .. } => f.write_str("checker"),
        }
    }
}

/// Parses `checker`, `transparent`, `#RRGGBB` or `#RRGGBBAA` (leading `#`
/// optional).
impl FromStr for FillStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "checker" => return Ok(FillStyle::checker()),
            "transparent" => return Ok(FillStyle::Solid([0, 0, 0, 0])),
            _ => {}
        }

        let hex = s.strip_prefix('#').unwrap_or(s);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "expected #RRGGBB, #RRGGBBAA, 'checker' or 'transparent', got '{}'",
                s
            ));
        }

        let mut rgba = [0xFF; 4];
        for (i, channel) in rgba.iter_mut().enumerate().take(hex.len() / 2) {
            let pair = &hex[i * 2..i * 2 + 2];
            *channel = u8::from_str_radix(pair, 16)
                .map_err(|_| format!("invalid hex colour component '{}'", pair))?;
        }
        Ok(FillStyle::Solid(rgba))
    }
}

/// Memoizes placeholders per `(tile size, fill style)`.
///
/// Every call for the same pair returns a clone of the same pinned image, so
/// callers can compare placeholders with [`TileImage::ptr_eq`].
#[derive(Default)]
pub struct PlaceholderCache {
    images: DashMap<(u32, FillStyle), TileImage>,
}

impl PlaceholderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tile_size: u32, fill: FillStyle) -> TileImage {
        self.images
            .entry((tile_size, fill))
            .or_insert_with(|| TileImage::pinned(fill.render(tile_size)))
            .clone()
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
