//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, inserts and expiry removals.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals (key not found or expired)
    pub misses: u64,
    /// Number of entries inserted
    pub inserts: u64,
    /// Number of inserts rejected because the key was already present
    pub duplicate_rejections: u64,
    /// Number of entries removed by expiry sweeps
    pub expired_removed: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Current height of the index tree
    pub tree_height: usize,
    /// Rotations performed by the index tree
    pub rotations: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_insert(&mut self) {
        self.inserts += 1;
    }

    pub fn record_duplicate(&mut self) {
        self.duplicate_rejections += 1;
    }

    pub fn record_expired(&mut self, count: usize) {
        self.expired_removed += count as u64;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_new() {
        let stats = CacheStats::new();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
        assert_eq!(stats.inserts, 0);
        assert_eq!(stats.expired_removed, 0);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_hit_rate() {
        let mut stats = CacheStats::new();
        assert_eq!(stats.hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_record_counters() {
        let mut stats = CacheStats::new();
        stats.record_insert();
        stats.record_duplicate();
        stats.record_expired(3);
        stats.record_expired(2);

        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.duplicate_rejections, 1);
        assert_eq!(stats.expired_removed, 5);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = CacheStats::new();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"hits\":0"));
        assert!(json.contains("\"tree_height\":0"));
    }
}
