//! Warm command - pre-load the tiles around a location into the disk cache.
//!
//! Tiles are scheduled through the regular loader in batches no larger than
//! its queue, so backpressure never drops a requested tile. Each batch is
//! finished once every tile has been announced or the loader goes idle.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use futures::StreamExt;
use tileloader::coord::tiles_around;
use tileloader::loader::TileLoader;
use tileloader::provider::AsyncHttpClient;
use tileloader::tile::TileKey;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often the loader is polled for idleness while waiting on a batch.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Consecutive idle polls before a batch is considered finished.
const IDLE_POLLS_REQUIRED: u32 = 3;

/// Arguments for the warm command.
pub struct WarmArgs {
    pub lat: f64,
    pub lon: f64,
    pub zoom: u16,
    pub radius_tiles: u32,
    pub timeout: Duration,
}

/// Outcome of warming one area.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WarmSummary {
    pub total: usize,
    /// Already in memory when requested
    pub cached: usize,
    pub loaded: usize,
    pub failed: usize,
}

/// Run the warm command.
pub fn run(runner: &CliRunner, args: WarmArgs) -> Result<(), CliError> {
    runner.log_startup("warm");
    let config = runner.config();
    let provider = config.to_provider();

    let tiles = tiles_around(
        provider.projection(),
        args.lat,
        args.lon,
        args.zoom,
        args.radius_tiles,
    )?;
    let keys: Vec<TileKey> = tiles
        .into_iter()
        .map(|(x, y)| TileKey::new(x, y, args.zoom, provider.clone()))
        .collect();

    println!("Warming tile cache");
    println!("==================");
    println!();
    println!("Location:  {}, {}", args.lat, args.lon);
    println!("Zoom:      {}", args.zoom);
    println!("Tiles:     {}", keys.len());
    println!("Provider:  {}", provider.id());
    println!("Cache:     {}", config.cache.directory.display());
    println!();

    let runtime = runner.runtime()?;
    let started = Instant::now();
    let (summary, report) = runtime.block_on(async {
        let loader = TileLoader::with_reqwest(config.to_loader_config(), runtime.handle().clone())?;
        let summary = warm(&loader, &keys, args.timeout).await;
        let report = loader.stats().format();
        loader.shutdown().await;
        Ok::<_, CliError>((summary, report))
    })?;

    info!(
        total = summary.total,
        cached = summary.cached,
        loaded = summary.loaded,
        failed = summary.failed,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Warm complete"
    );

    println!(
        "Done in {:.1}s: {} loaded, {} already cached, {} failed",
        started.elapsed().as_secs_f64(),
        summary.loaded,
        summary.cached,
        summary.failed
    );
    println!();
    println!("{}", report);

    if summary.failed > 0 {
        return Err(CliError::WarmIncomplete {
            failed: summary.failed,
            total: summary.total,
        });
    }
    Ok(())
}

/// Load `keys` through `loader`, waiting at most `timeout` per batch.
pub async fn warm<C: AsyncHttpClient + 'static>(
    loader: &TileLoader<C>,
    keys: &[TileKey],
    timeout: Duration,
) -> WarmSummary {
    let mut summary = WarmSummary {
        total: keys.len(),
        ..Default::default()
    };
    let batch_size = loader.config().queue_capacity.max(1);

    for batch in keys.chunks(batch_size) {
        // Subscribe before scheduling so no announcement is missed.
        let mut loaded = Box::pin(loader.on_loaded());

        let mut outstanding: HashSet<&TileKey> = HashSet::new();
        for key in batch {
            // Local tiles resolve to a pinned image, so ask the memory tier.
            if loader.memory_cache().contains(key) {
                summary.cached += 1;
            } else {
                loader.lookup(key);
                outstanding.insert(key);
            }
        }

        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut ticker = interval(IDLE_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut idle_polls = 0;

        while !outstanding.is_empty() {
            tokio::select! {
                Some(key) = loaded.next() => {
                    if outstanding.remove(&key) {
                        summary.loaded += 1;
                    }
                }
                _ = ticker.tick() => {
                    let stats = loader.stats();
                    if stats.queued == 0 && stats.in_flight == 0 {
                        idle_polls += 1;
                        if idle_polls >= IDLE_POLLS_REQUIRED {
                            break;
                        }
                    } else {
                        idle_polls = 0;
                    }
                }
                _ = &mut deadline => {
                    warn!(remaining = outstanding.len(), "Timed out waiting for tiles");
                    break;
                }
            }
        }

        // Announcements can still be buffered when the loader went idle.
        for key in outstanding {
            if loader.memory_cache().contains(key) {
                summary.loaded += 1;
            } else {
                summary.failed += 1;
            }
        }
    }

    summary
}
