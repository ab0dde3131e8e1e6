//! Background resolution of scheduled keys.
//!
//! Each worker drains the shared queue until shutdown. For every key it
//! claims, it tries memory, then disk, then the provider: tiles without a
//! URL resolve to the empty-tile image, everything else is fetched once per
//! URL and published under every key waiting on that URL.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::config::LoaderConfig;
use super::events::TileEvents;
use super::inflight::{KeyClaim, KeyClaims, UrlClaims};
use super::queue::WorkQueue;
use super::stats::LoaderCounters;
use crate::cache::{DiskCache, MemoryCache};
use crate::provider::AsyncHttpClient;
use crate::tile::{PlaceholderCache, TileImage, TileKey};

/// State shared by the loader handle and its workers.
pub(crate) struct Shared<C> {
    pub config: LoaderConfig,
    pub client: C,
    pub memory: MemoryCache,
    pub disk: DiskCache,
    pub queue: WorkQueue,
    pub key_claims: KeyClaims,
    pub url_claims: UrlClaims,
    pub placeholders: PlaceholderCache,
    pub events: TileEvents,
    pub counters: LoaderCounters,
    pub shutdown: CancellationToken,
}

impl<C> Shared<C> {
    /// Placeholder for `key`, sized to its provider's tiles.
    pub fn placeholder(&self, key: &TileKey) -> TileImage {
        self.placeholders
            .get(key.tile_size_px(), self.config.empty_tile_fill)
    }
}

/// Worker loop: wait for a key, resolve it, repeat until cancelled.
pub(crate) async fn run_worker<C: AsyncHttpClient>(worker_id: usize, shared: Arc<Shared<C>>) {
    debug!(worker_id, "Tile worker started");

    loop {
        let key = tokio::select! {
            biased;

            _ = shared.shutdown.cancelled() => break,

            key = shared.queue.pop() => key,
        };

        resolve(&shared, key).await;
    }

    debug!(worker_id, "Tile worker stopped");
}

async fn resolve<C: AsyncHttpClient>(shared: &Shared<C>, key: TileKey) {
    let Some(claim) = shared.key_claims.try_claim(&key) else {
        trace!(tile = %key, "Tile already claimed by another worker");
        LoaderCounters::bump(&shared.counters.dedup_skips);
        return;
    };

    if shared.memory.contains(&key) {
        trace!(tile = %key, "Tile already in memory");
        LoaderCounters::bump(&shared.counters.dedup_skips);
        return;
    }

    match shared.disk.get(&key).await {
        Ok(Some(image)) => {
            trace!(tile = %key, "Tile resolved from disk");
            LoaderCounters::bump(&shared.counters.disk_hits);
            shared.memory.set(&key, Some(image));
            announce(shared, &key);
            return;
        }
        Ok(None) => {}
        Err(e) => {
            LoaderCounters::bump(&shared.counters.disk_errors);
            warn!(tile = %key, error = %e, "Disk cache read failed");
            return;
        }
    }

    match key.url() {
        None => resolve_local(shared, claim).await,
        Some(url) => resolve_remote(shared, claim, url).await,
    }
}

async fn resolve_local<C>(shared: &Shared<C>, claim: KeyClaim) {
    let key = claim.key();
    let image = shared.placeholder(key);
    LoaderCounters::bump(&shared.counters.local_tiles);
    publish(shared, key, image).await;
}

async fn resolve_remote<C: AsyncHttpClient>(shared: &Shared<C>, claim: KeyClaim, url: String) {
    let key = claim.key().clone();
    let Some(url_claim) = shared.url_claims.claim(&url, claim) else {
        debug!(tile = %key, url = %url, "URL already being fetched, waiting on it");
        LoaderCounters::bump(&shared.counters.dedup_skips);
        return;
    };

    LoaderCounters::bump(&shared.counters.fetches);
    let response = tokio::select! {
        biased;

        _ = shared.shutdown.cancelled() => {
            debug!(tile = %key, url = %url_claim.url(), "Fetch aborted by shutdown");
            return;
        }

        response = shared.client.get(url_claim.url()) => response,
    };

    let image = match response {
        Ok(bytes) => TileImage::decode(&bytes).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };
    let image = match image {
        Ok(image) => image,
        Err(error) => {
            LoaderCounters::bump(&shared.counters.fetch_failures);
            warn!(tile = %key, url = %url_claim.url(), error = %error, "Tile fetch failed");
            return;
        }
    };

    trace!(
        tile = %key,
        width = image.width(),
        height = image.height(),
        "Tile downloaded"
    );

    let claims = url_claim.finish();
    for (index, claim) in claims.iter().enumerate() {
        // Aliased keys get their own copy so each cache entry is released
        // independently.
        let image = if index == 0 {
            image.clone()
        } else {
            image.deep_clone()
        };
        publish(shared, claim.key(), image).await;
    }
}

/// Write a resolved tile through to disk, then memory, then announce it.
///
/// A failed disk write is logged; the tile is still served from memory.
async fn publish<C>(shared: &Shared<C>, key: &TileKey, image: TileImage) {
    if let Err(e) = shared.disk.set(key, Some(&image)).await {
        LoaderCounters::bump(&shared.counters.disk_errors);
        warn!(tile = %key, error = %e, "Disk cache write failed");
    }
    shared.memory.set(key, Some(image));
    announce(shared, key);
}

fn announce<C>(shared: &Shared<C>, key: &TileKey) {
    LoaderCounters::bump(&shared.counters.resolved);
    shared.events.publish(key.clone());
}
