//! Cache tier abstraction.

use crate::cache::types::CacheError;
use crate::cache::CacheStatistics;
use crate::tile::{TileImage, TileKey};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by [`TileCache`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Uniform contract shared by the memory and disk tiers.
///
/// Both tiers are internally thread-safe and can be driven concurrently
/// from every worker. The memory tier also exposes synchronous inherent
/// methods for the non-blocking lookup path.
///
/// # Example
///
/// ```ignore
/// async fn promote(from: &dyn TileCache, to: &dyn TileCache, key: &TileKey) -> Result<bool, CacheError> {
///     match from.get(key).await? {
///         Some(image) => {
///             to.set(key, Some(image)).await?;
///             Ok(true)
///         }
///         None => Ok(false),
///     }
/// }
/// ```
pub trait TileCache: Send + Sync {
    /// Get the tile for `key`, counting a hit or a miss.
    fn get<'a>(&'a self, key: &'a TileKey) -> BoxFuture<'a, Result<Option<TileImage>, CacheError>>;

    /// Store `image` under `key`, or remove the entry when `image` is `None`.
    fn set<'a>(
        &'a self,
        key: &'a TileKey,
        image: Option<TileImage>,
    ) -> BoxFuture<'a, Result<(), CacheError>>;

    /// Snapshot of hits, misses, entry count, size and capacity.
    fn statistics(&self) -> CacheStatistics;
}
