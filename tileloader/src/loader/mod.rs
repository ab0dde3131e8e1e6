//! Background tile loader.
//!
//! Serves tiles from the memory tier without blocking and resolves misses
//! in the background:
//!
//! ```text
//! lookup ──► memory hit ─────────────────────────────► image
//!    │
//!    └─► work queue (drop-oldest) ──► worker ──► placeholder returned now
//!                                       │
//!                      claim key ◄──────┘
//!                          │
//!              memory? ─ disk? ─ provider URL?
//!                                 │         │
//!                            empty tile   claim URL ─► fetch ─► decode
//!                                 │                               │
//!                                 └──► disk, memory, on_loaded ◄──┘
//! ```

mod config;
mod events;
mod inflight;
mod queue;
mod stats;
mod tile_loader;
mod worker;

pub use config::{
    default_worker_count, LoaderConfig, LoaderError, DEFAULT_QUEUE_CAPACITY, MIN_MEMORY_BUDGET,
};
pub use events::{loaded_stream, EVENT_CHANNEL_CAPACITY};
pub use stats::LoaderStats;
pub use tile_loader::TileLoader;
