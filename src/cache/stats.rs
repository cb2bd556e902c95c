//! Cache Statistics Module
//!
//! Storage footprint of the store and hit/miss counters of the lookup path.

use serde::Serialize;

// == Store Stats ==
/// Snapshot of what is physically stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of stored entries, expired ones not yet reaped included
    pub total_entries: usize,
    /// Approximate bytes used by keys and serialized entries
    pub total_size_bytes: usize,
    /// Creation time of the oldest entry (Unix milliseconds)
    pub oldest_entry: Option<u64>,
    /// Creation time of the newest entry (Unix milliseconds)
    pub newest_entry: Option<u64>,
}

impl StoreStats {
    /// Folds one entry's creation time into the oldest/newest bounds.
    pub fn record_created(&mut self, created_at: u64) {
        self.oldest_entry = Some(self.oldest_entry.map_or(created_at, |t| t.min(created_at)));
        self.newest_entry = Some(self.newest_entry.map_or(created_at, |t| t.max(created_at)));
    }
}

// == Lookup Stats ==
/// Tracks lookup performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LookupStats {
    /// Lookups answered by the exact canonical key
    pub exact_hits: u64,
    /// Lookups answered by a broader compatible entry
    pub compatible_hits: u64,
    /// Lookups that required a real query
    pub misses: u64,
    /// Writes the backend refused (quota or I/O)
    pub skipped_writes: u64,
}

impl LookupStats {
    // == Constructor ==
    /// Creates a new LookupStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.exact_hits + self.compatible_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    pub fn record_exact_hit(&mut self) {
        self.exact_hits += 1;
    }

    pub fn record_compatible_hit(&mut self) {
        self.compatible_hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_skipped_write(&mut self) {
        self.skipped_writes += 1;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = LookupStats::new();
        assert_eq!(stats.exact_hits, 0);
        assert_eq!(stats.compatible_hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.skipped_writes, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(LookupStats::new().hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_counts_both_hit_kinds() {
        let mut stats = LookupStats::new();
        stats.record_exact_hit();
        stats.record_compatible_hit();
        stats.record_miss();
        stats.record_miss();
        assert_eq!(stats.hit_rate(), 0.5);
    }

    #[test]
    fn test_record_created_bounds() {
        let mut stats = StoreStats::default();
        stats.record_created(500);
        stats.record_created(100);
        stats.record_created(900);

        assert_eq!(stats.oldest_entry, Some(100));
        assert_eq!(stats.newest_entry, Some(900));
    }
}
