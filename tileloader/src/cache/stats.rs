//! Cache statistics reporting.

use crate::config::display_size;

/// Read-only snapshot of one cache tier, computed on demand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Cumulative lookups that found the tile
    pub hits: u64,
    /// Cumulative lookups that did not
    pub misses: u64,
    pub entry_count: u64,
    pub size_bytes: u64,
    pub capacity_bytes: u64,
}

impl CacheStatistics {
    /// Hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Fraction of the byte budget in use (may exceed 1.0 for advisory
    /// budgets).
    pub fn utilization(&self) -> f64 {
        if self.capacity_bytes == 0 {
            0.0
        } else {
            self.size_bytes as f64 / self.capacity_bytes as f64
        }
    }

    /// Format statistics as a human-readable block.
    pub fn format(&self, tier: &str) -> String {
        format!(
            r#"{}
  Entries:     {}
  Size:        {} / {} ({:.1}%)
  Hits:        {}
  Misses:      {}
  Hit Rate:    {:.1}%
"#,
            tier,
            self.entry_count,
            display_size(self.size_bytes),
            display_size(self.capacity_bytes),
            self.utilization() * 100.0,
            self.hits,
            self.misses,
            self.hit_rate() * 100.0,
        )
    }
}
