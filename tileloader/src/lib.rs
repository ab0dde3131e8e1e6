//! Tileloader - map tile acquisition and caching
//!
//! This library turns `(x, y, zoom, provider)` tile coordinates into decoded
//! bitmaps for a render loop. Lookups are answered synchronously from a
//! byte-budgeted memory tier; misses are resolved in the background from a
//! persistent disk tier or the provider's tile server.
//!
//! # High-Level API
//!
//! ```ignore
//! use tileloader::config::ConfigFile;
//! use tileloader::loader::TileLoader;
//! use tileloader::tile::TileKey;
//!
//! let config = ConfigFile::load()?;
//! let provider = config.to_provider();
//! let loader = TileLoader::with_reqwest(config.to_loader_config(), runtime.handle().clone())?;
//!
//! // Called every frame: never blocks.
//! let image = loader.lookup(&TileKey::new(5279, 12754, 15, provider.clone()));
//! ```

pub mod cache;
pub mod config;
pub mod coord;
pub mod loader;
pub mod logging;
pub mod provider;
pub mod tile;

/// Version of the tileloader library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
