//! Tile identity and bitmaps
//!
//! [`TileKey`] names a tile, [`TileImage`] holds its decoded pixels, and
//! [`PlaceholderCache`] hands out the memoized stand-ins served while a
//! tile is loading.

mod bitmap;
mod key;
mod placeholder;

pub use bitmap::TileImage;
pub use key::TileKey;
pub use placeholder::{FillStyle, PlaceholderCache, DEFAULT_FILL_COLOR};
