//! The loader handle.

use std::sync::Arc;

use futures::Stream;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use super::config::{LoaderConfig, LoaderError};
use super::events::{loaded_stream, TileEvents};
use super::inflight::{KeyClaims, UrlClaims};
use super::queue::{PushOutcome, WorkQueue};
use super::stats::{LoaderCounters, LoaderStats};
use super::worker::{run_worker, Shared};
use crate::cache::{CacheError, DiskCache, MemoryCache};
use crate::provider::{AsyncHttpClient, AsyncReqwestClient};
use crate::tile::{PlaceholderCache, TileImage, TileKey};

/// Background tile loader.
///
/// [`lookup`](Self::lookup) is safe to call from a render loop: it only
/// touches the memory tier and the work queue, and always returns an image
/// immediately. Misses are resolved by a fixed pool of workers spawned on
/// the runtime handed to [`start`](Self::start); each resolved key is
/// announced through [`subscribe`](Self::subscribe) and
/// [`on_loaded`](Self::on_loaded).
///
/// # Example
///
/// ```ignore
/// let loader = TileLoader::with_reqwest(LoaderConfig::new("/tmp/tiles"), Handle::current())?;
/// let mut loaded = loader.subscribe();
///
/// let image = loader.lookup(&key); // placeholder on first call
/// let ready = loaded.recv().await?;
/// let image = loader.lookup(&ready); // real tile
/// ```
pub struct TileLoader<C: AsyncHttpClient + 'static = AsyncReqwestClient> {
    shared: Arc<Shared<C>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl TileLoader<AsyncReqwestClient> {
    /// Start a loader that fetches over HTTP with reqwest, using the
    /// configured request timeout.
    pub fn with_reqwest(config: LoaderConfig, runtime: Handle) -> Result<Self, LoaderError> {
        let client = AsyncReqwestClient::with_timeout(config.request_timeout)?;
        Self::start(config, client, runtime)
    }
}

impl<C: AsyncHttpClient + 'static> TileLoader<C> {
    /// Validate `config`, open both cache tiers and spawn the workers.
    ///
    /// The disk root is created (and scanned) here, so configuration and
    /// filesystem problems surface before any lookup.
    pub fn start(config: LoaderConfig, client: C, runtime: Handle) -> Result<Self, LoaderError> {
        config.validate()?;

        let memory = MemoryCache::new(&config.memory)?;
        let disk = DiskCache::new(&config.disk)?;

        let shared = Arc::new(Shared {
            queue: WorkQueue::new(config.queue_capacity),
            client,
            memory,
            disk,
            key_claims: KeyClaims::new(),
            url_claims: UrlClaims::new(),
            placeholders: PlaceholderCache::new(),
            events: TileEvents::new(),
            counters: LoaderCounters::default(),
            shutdown: CancellationToken::new(),
            config,
        });

        let workers = (0..shared.config.worker_count)
            .map(|worker_id| runtime.spawn(run_worker(worker_id, Arc::clone(&shared))))
            .collect();

        info!(
            workers = shared.config.worker_count,
            queue_capacity = shared.config.queue_capacity,
            cache_dir = %shared.disk.cache_dir().display(),
            "Tile loader started"
        );

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
        })
    }

    /// Return the tile for `key` if it is in memory, otherwise schedule it
    /// and return a placeholder sized to the provider's tiles.
    ///
    /// Never blocks and never fails. After [`shutdown`](Self::shutdown)
    /// every call returns a placeholder and schedules nothing.
    pub fn lookup(&self, key: &TileKey) -> TileImage {
        let shared = &self.shared;
        LoaderCounters::bump(&shared.counters.lookups);

        if let Some(image) = shared.memory.get(key) {
            LoaderCounters::bump(&shared.counters.memory_hits);
            return image;
        }

        if !shared.shutdown.is_cancelled() && !shared.key_claims.contains(key) {
            match shared.queue.push(key.clone()) {
                PushOutcome::Queued => {
                    LoaderCounters::bump(&shared.counters.enqueued);
                    trace!(tile = %key, "Tile scheduled");
                }
                PushOutcome::AlreadyQueued => {}
                PushOutcome::Displaced(oldest) => {
                    LoaderCounters::bump(&shared.counters.enqueued);
                    LoaderCounters::bump(&shared.counters.dropped);
                    debug!(tile = %key, dropped = %oldest, "Work queue full, dropped oldest");
                }
            }
        }

        LoaderCounters::bump(&shared.counters.placeholders_served);
        shared.placeholder(key)
    }

    /// Receiver of every key resolved from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TileKey> {
        self.shared.events.subscribe()
    }

    /// Stream of every key resolved from now on.
    ///
    /// Ends once the loader is dropped.
    pub fn on_loaded(&self) -> impl Stream<Item = TileKey> + Send + 'static {
        loaded_stream(self.subscribe())
    }

    /// Remove `key` from both tiers. The next lookup schedules it again.
    pub async fn invalidate(&self, key: &TileKey) -> Result<(), CacheError> {
        self.shared.memory.set(key, None);
        self.shared.disk.set(key, None).await
    }

    /// True if `key` is waiting in the work queue.
    pub fn is_pending(&self, key: &TileKey) -> bool {
        self.shared.queue.contains(key)
    }

    /// True if a worker currently holds `key`.
    pub fn is_in_flight(&self, key: &TileKey) -> bool {
        self.shared.key_claims.contains(key)
    }

    /// Keys waiting in the work queue, oldest first.
    pub fn pending(&self) -> Vec<TileKey> {
        self.shared.queue.snapshot()
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    pub fn memory_cache(&self) -> &MemoryCache {
        &self.shared.memory
    }

    pub fn disk_cache(&self) -> &DiskCache {
        &self.shared.disk
    }

    pub fn is_shut_down(&self) -> bool {
        self.shared.shutdown.is_cancelled()
    }

    pub fn stats(&self) -> LoaderStats {
        let shared = &self.shared;
        LoaderStats::from_counters(
            &shared.counters,
            shared.queue.len(),
            shared.key_claims.len(),
            shared.memory.statistics(),
            shared.disk.statistics(),
        )
    }

    /// Stop the workers, abort in-flight requests and release every image
    /// held by the memory tier.
    ///
    /// Idempotent. Disk contents are kept.
    pub async fn shutdown(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        info!("Tile loader shutting down");
        self.shared.shutdown.cancel();

        let workers = std::mem::take(&mut *self.workers.lock());
        for worker in workers {
            if let Err(e) = worker.await {
                debug!(error = %e, "Tile worker ended abnormally");
            }
        }

        let discarded = self.shared.queue.clear();
        self.shared.memory.clear();

        info!(
            discarded,
            in_flight_urls = self.shared.url_claims.len(),
            "Tile loader stopped"
        );
    }
}

impl<C: AsyncHttpClient + 'static> Drop for TileLoader<C> {
    fn drop(&mut self) {
        // Workers hold the shared state and may outlive the handle.
        self.shared.shutdown.cancel();
        self.shared.queue.clear();
        self.shared.memory.clear();
    }
}
