//! Tile source abstraction
//!
//! A [`TileProvider`] tells the loader where a tile comes from (a URL, or
//! nothing when the tile is synthesized locally), how big it is and which
//! projection it uses. The network itself sits behind [`AsyncHttpClient`]
//! so the loader can be exercised without real servers.
//!
//! ```ignore
//! use tileloader::provider::{ProviderRef, UrlTemplateProvider};
//!
//! let provider = ProviderRef::new(
//!     UrlTemplateProvider::new("osm", "https://tile.openstreetmap.org/{z}/{x}/{y}.png"),
//! );
//! ```

mod http;
mod local;
mod template;
mod types;

pub use http::{AsyncHttpClient, AsyncReqwestClient, DEFAULT_REQUEST_TIMEOUT};
pub use local::LocalProvider;
pub use template::{UrlTemplateProvider, DEFAULT_TILE_SIZE};
pub use types::{ProviderError, ProviderRef, TileProvider};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
