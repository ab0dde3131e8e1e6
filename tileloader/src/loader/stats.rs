//! Loader counters and snapshots.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::CacheStatistics;

/// Monotonic counters updated by `lookup` and the workers.
#[derive(Debug, Default)]
pub(crate) struct LoaderCounters {
    pub lookups: AtomicU64,
    pub memory_hits: AtomicU64,
    pub placeholders_served: AtomicU64,
    pub enqueued: AtomicU64,
    pub dropped: AtomicU64,
    pub fetches: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub disk_hits: AtomicU64,
    pub disk_errors: AtomicU64,
    pub local_tiles: AtomicU64,
    pub dedup_skips: AtomicU64,
    pub resolved: AtomicU64,
}

impl LoaderCounters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn read(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of a loader.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoaderStats {
    /// Calls to `lookup`
    pub lookups: u64,
    /// Lookups answered from memory
    pub memory_hits: u64,
    /// Lookups answered with a placeholder
    pub placeholders_served: u64,
    /// Keys added to the work queue
    pub enqueued: u64,
    /// Pending keys displaced by backpressure
    pub dropped: u64,
    /// Remote requests issued
    pub fetches: u64,
    /// Remote requests or decodes that failed
    pub fetch_failures: u64,
    /// Keys resolved from the disk tier
    pub disk_hits: u64,
    /// Disk reads or writes that failed
    pub disk_errors: u64,
    /// Keys resolved without a remote source
    pub local_tiles: u64,
    /// Keys skipped because they were already claimed or in memory
    pub dedup_skips: u64,
    /// Keys published to memory and announced
    pub resolved: u64,
    /// Keys waiting in the queue
    pub queued: usize,
    /// Keys currently claimed by a worker
    pub in_flight: usize,
    pub memory: CacheStatistics,
    pub disk: CacheStatistics,
}

impl LoaderStats {
    pub(crate) fn from_counters(
        counters: &LoaderCounters,
        queued: usize,
        in_flight: usize,
        memory: CacheStatistics,
        disk: CacheStatistics,
    ) -> Self {
        Self {
            lookups: LoaderCounters::read(&counters.lookups),
            memory_hits: LoaderCounters::read(&counters.memory_hits),
            placeholders_served: LoaderCounters::read(&counters.placeholders_served),
            enqueued: LoaderCounters::read(&counters.enqueued),
            dropped: LoaderCounters::read(&counters.dropped),
            fetches: LoaderCounters::read(&counters.fetches),
            fetch_failures: LoaderCounters::read(&counters.fetch_failures),
            disk_hits: LoaderCounters::read(&counters.disk_hits),
            disk_errors: LoaderCounters::read(&counters.disk_errors),
            local_tiles: LoaderCounters::read(&counters.local_tiles),
            dedup_skips: LoaderCounters::read(&counters.dedup_skips),
            resolved: LoaderCounters::read(&counters.resolved),
            queued,
            in_flight,
            memory,
            disk,
        }
    }

    /// Fraction of lookups answered from memory (0.0 when idle).
    pub fn memory_hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.memory_hits as f64 / self.lookups as f64
        }
    }

    /// Multi-line human-readable report.
    pub fn format(&self) -> String {
        format!(
            "Lookups:      {} ({:.1}% from memory, {} placeholders)\n\
             Queue:        {} queued, {} in flight, {} enqueued, {} dropped\n\
             Resolution:   {} resolved, {} from disk, {} local, {} skipped\n\
             Network:      {} fetches, {} failed\n\
             Disk errors:  {}\n\
             {}\n\
             {}",
            self.lookups,
            self.memory_hit_rate() * 100.0,
            self.placeholders_served,
            self.queued,
            self.in_flight,
            self.enqueued,
            self.dropped,
            self.resolved,
            self.disk_hits,
            self.local_tiles,
            self.dedup_skips,
            self.fetches,
            self.fetch_failures,
            self.disk_errors,
            self.memory.format("Memory"),
            self.disk.format("Disk"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reads_counters() {
        let counters = LoaderCounters::default();
        LoaderCounters::bump(&counters.lookups);
        LoaderCounters::bump(&counters.lookups);
        LoaderCounters::bump(&counters.memory_hits);
        LoaderCounters::bump(&counters.dropped);

        let stats = LoaderStats::from_counters(
            &counters,
            3,
            1,
            CacheStatistics::default(),
            CacheStatistics::default(),
        );
        assert_eq!(stats.lookups, 2);
        assert_eq!(stats.memory_hits, 1);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.queued, 3);
        assert_eq!(stats.in_flight, 1);
        assert!((stats.memory_hit_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_mentions_every_section() {
        let stats = LoaderStats {
            lookups: 10,
            memory_hits: 4,
            fetches: 6,
            fetch_failures: 1,
            ..Default::default()
        };
        let report = stats.format();

        assert!(report.contains("Lookups:      10 (40.0% from memory"));
        assert!(report.contains("6 fetches, 1 failed"));
        assert!(report.contains("Memory"));
        assert!(report.contains("Disk"));
    }
}
