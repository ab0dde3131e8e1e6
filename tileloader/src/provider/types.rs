//! Provider types and traits

use crate::coord::Projection;
use crate::tile::TileKey;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while fetching tile imagery.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed (connection, timeout, non-success status)
    #[error("HTTP error: {0}")]
    HttpError(String),
    /// Response body could not be used as a tile image
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Capability supplying everything the loader needs to know about a tile
/// source.
///
/// Implementations are stateless beyond their construction-time settings
/// (base URL, API key, subdomains) and must be safe to share across worker
/// tasks.
pub trait TileProvider: Send + Sync {
    /// Stable identifier used in cache keys and as the on-disk directory name.
    ///
    /// Two providers with the same id are treated as the same tile source.
    fn id(&self) -> &str;

    /// Resolves the URL the tile should be downloaded from.
    ///
    /// Returns `None` when the tile should be synthesized locally instead
    /// (offline sources, coordinates outside the provider's coverage).
    fn tile_url(&self, key: &TileKey) -> Option<String>;

    /// Edge length of a tile in pixels.
    fn tile_size_px(&self) -> u32;

    /// Projection mapping geographic coordinates to this provider's tiles.
    fn projection(&self) -> &dyn Projection;
}

/// Shared handle to a [`TileProvider`].
///
/// Equality and hashing use the provider's [`id`](TileProvider::id), so a
/// handle can sit inside [`TileKey`] without requiring pointer identity.
#[derive(Clone)]
pub struct ProviderRef(Arc<dyn TileProvider>);

impl ProviderRef {
    /// Wrap a provider in a shared handle.
    pub fn new(provider: impl TileProvider + 'static) -> Self {
        Self(Arc::new(provider))
    }

    /// Wrap an already shared provider.
    pub fn from_arc(provider: Arc<dyn TileProvider>) -> Self {
        Self(provider)
    }
}

impl Deref for ProviderRef {
    type Target = dyn TileProvider;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ProviderRef {
    fn eq(&self, other: &Self) -> bool {
        self.0.id() == other.0.id()
    }
}

impl Eq for ProviderRef {}

impl Hash for ProviderRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id().hash(state);
    }
}

impl fmt::Debug for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ProviderRef").field(&self.0.id()).finish()
    }
}

impl fmt::Display for ProviderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::LocalProvider;
    use std::collections::hash_map::DefaultHasher;

    fn hash_of(provider: &ProviderRef) -> u64 {
        let mut hasher = DefaultHasher::new();
        provider.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::HttpError("HTTP 404 from http://t/1.png".to_string());
        assert_eq!(err.to_string(), "HTTP error: HTTP 404 from http://t/1.png");

        let err: Box<dyn std::error::Error> =
            Box::new(ProviderError::InvalidResponse("empty body".to_string()));
        assert_eq!(err.to_string(), "Invalid response: empty body");
    }

    #[test]
    fn test_provider_ref_equality_uses_id() {
        let a = ProviderRef::new(LocalProvider::new("offline", 256));
        let b = ProviderRef::new(LocalProvider::new("offline", 512));
        let c = ProviderRef::new(LocalProvider::new("other", 256));

        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
        assert_ne!(a, c);
    }

    #[test]
    fn test_provider_ref_deref() {
        let provider = ProviderRef::new(LocalProvider::new("offline", 256));
        assert_eq!(provider.id(), "offline");
        assert_eq!(provider.tile_size_px(), 256);
        assert_eq!(provider.to_string(), "offline");
        assert_eq!(format!("{:?}", provider), "ProviderRef(\"offline\")");
    }
}
