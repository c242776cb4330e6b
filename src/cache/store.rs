//! Cache Store Module
//!
//! Key/value façade over the AVL index, with sliding TTL expiry, batch
//! deletion and the expiry sweep.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::cache::{AvlTree, CacheEntry, CacheStats, Clock, Query, SystemClock};
use crate::error::{CacheError, Result};

/// A store shared across tasks.
///
/// The lock is the single mutual-exclusion domain for the tree. `get` refreshes
/// metadata, so it needs the write half like every structural mutation.
pub type SharedStore<V> = Arc<RwLock<CacheStore<V>>>;

// == Cache Store ==
/// Main cache storage with per-entry TTL support.
#[derive(Debug)]
pub struct CacheStore<V> {
    /// Key-ordered index of entries
    tree: AvlTree<V>,
    /// Performance statistics
    stats: CacheStats,
    /// Default TTL in seconds for entries without explicit TTL
    default_ttl: u64,
    /// Time source for stamping and expiry
    clock: Arc<dyn Clock>,
}

impl<V> CacheStore<V> {
    // == Constructor ==
    /// Creates a new CacheStore reading wall-clock time.
    ///
    /// # Arguments
    /// * `default_ttl` - Default TTL in seconds for entries without explicit TTL
    pub fn new(default_ttl: u64) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Creates a new CacheStore with a custom time source.
    pub fn with_clock(default_ttl: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            tree: AvlTree::new(),
            stats: CacheStats::new(),
            default_ttl,
            clock,
        }
    }

    /// Wraps the store for sharing across tasks.
    pub fn into_shared(self) -> SharedStore<V> {
        Arc::new(RwLock::new(self))
    }

    // == Put ==
    /// Inserts a value with an optional TTL.
    ///
    /// Never overwrites: an existing key, expired or not, yields `DuplicateKey`
    /// and the stored entry is left untouched.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Optional TTL in seconds (uses default_ttl if None)
    pub fn put(&mut self, key: i64, value: V, ttl: Option<u64>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl == 0 {
            return Err(CacheError::InvalidArgument(
                "TTL must be a positive number of seconds".to_string(),
            ));
        }

        let entry = CacheEntry::new(key, value, ttl, self.clock.now_ms());
        if let Err(err) = self.tree.insert(entry) {
            self.stats.record_duplicate();
            return Err(err);
        }

        self.stats.record_insert();
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key and restarts its TTL window.
    ///
    /// An entry past its TTL is reported as `NotFound` even before the sweep
    /// removes it.
    pub fn get(&mut self, key: i64) -> Result<V>
    where
        V: Clone,
    {
        let now = self.clock.now_ms();
        match self.tree.find_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                self.stats.record_hit();
                Ok(entry.value.clone())
            }
            _ => {
                self.stats.record_miss();
                Err(CacheError::NotFound(key))
            }
        }
    }

    // == Touch ==
    /// Restarts the TTL window of a live entry without reading it.
    pub fn touch(&mut self, key: i64) -> Result<()> {
        let now = self.clock.now_ms();
        match self.tree.find_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.touch(now);
                Ok(())
            }
            _ => Err(CacheError::NotFound(key)),
        }
    }

    // == Contains ==
    /// Returns true if a live entry exists for `key`.
    ///
    /// Read-only: does not refresh the entry.
    pub fn contains(&self, key: i64) -> bool {
        let now = self.clock.now_ms();
        match self.tree.find(Query::Key(key)) {
            Ok(found) => found.iter().any(|entry| !entry.is_expired(now)),
            Err(_) => false,
        }
    }

    // == Delete ==
    /// Removes an entry by key. Missing keys are ignored.
    ///
    /// Returns true if an entry was removed.
    pub fn delete(&mut self, key: i64) -> bool {
        self.tree.delete(key).is_some()
    }

    // == Delete Group ==
    /// Removes every listed key that is present, one at a time.
    ///
    /// Returns the number of entries removed.
    pub fn delete_group(&mut self, keys: &[i64]) -> Result<usize> {
        self.tree.delete_range(keys)
    }

    // == Expired Keys ==
    /// Collects the keys of every entry whose TTL has elapsed.
    pub fn expired_keys(&self) -> Vec<i64> {
        let now = self.clock.now_ms();
        let expired = move |entry: &CacheEntry<V>| entry.is_expired(now);

        match self.tree.find(Query::Scan(&expired)) {
            Ok(found) => found.iter().map(|entry| entry.key).collect(),
            // EmptyStore: nothing to expire
            Err(_) => Vec::new(),
        }
    }

    // == Sweep Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        self.take_expired().len()
    }

    /// Removes all expired entries and returns their keys.
    pub fn take_expired(&mut self) -> Vec<i64> {
        let expired = self.expired_keys();
        if expired.is_empty() {
            return expired;
        }

        let removed: Vec<i64> = expired
            .into_iter()
            .filter(|key| self.tree.delete(*key).is_some())
            .collect();
        self.stats.record_expired(removed.len());
        debug!(
            removed = removed.len(),
            remaining = self.tree.len(),
            "Swept expired entries"
        );
        removed
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.total_entries = self.tree.len();
        stats.tree_height = self.tree.height();
        stats.rotations = self.tree.rotations();
        stats
    }

    /// Default TTL in seconds.
    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    /// Read access to the underlying index.
    pub fn tree(&self) -> &AvlTree<V> {
        &self.tree
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    // == Is Empty ==
    /// Returns true if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use std::time::Duration;

    fn store_with_clock() -> (CacheStore<String>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = CacheStore::with_clock(30, clock.clone());
        (store, clock)
    }

    #[test]
    fn test_store_new() {
        let store: CacheStore<String> = CacheStore::new(30);
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
        assert_eq!(store.default_ttl(), 30);
    }

    #[test]
    fn test_store_put_and_get() {
        let (mut store, _) = store_with_clock();

        store.put(1, "value1".to_string(), None).unwrap();
        let value = store.get(1).unwrap();

        assert_eq!(value, "value1");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let (mut store, _) = store_with_clock();

        assert_eq!(store.get(99), Err(CacheError::NotFound(99)));

        store.put(1, "a".to_string(), None).unwrap();
        assert_eq!(store.get(99), Err(CacheError::NotFound(99)));
    }

    #[test]
    fn test_store_duplicate_put() {
        let (mut store, _) = store_with_clock();

        store.put(1, "a".to_string(), None).unwrap();
        let result = store.put(1, "b".to_string(), None);

        assert_eq!(result, Err(CacheError::DuplicateKey(1)));
        assert_eq!(store.get(1).unwrap(), "a");
        assert_eq!(store.stats().duplicate_rejections, 1);
    }

    #[test]
    fn test_store_zero_ttl_rejected() {
        let (mut store, _) = store_with_clock();

        let result = store.put(1, "a".to_string(), Some(0));
        assert!(matches!(result, Err(CacheError::InvalidArgument(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_ttl_expiration() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "a".to_string(), Some(1)).unwrap();
        clock.advance(Duration::from_secs(2));

        // Hidden from reads but still physically present
        assert_eq!(store.get(1), Err(CacheError::NotFound(1)));
        assert_eq!(store.len(), 1);

        assert_eq!(store.sweep_expired(), 1);
        assert!(store.tree().get(1).is_none());
        store.tree().validate().unwrap();
    }

    #[test]
    fn test_store_sliding_expiration() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "a".to_string(), Some(2)).unwrap();
        for _ in 0..10 {
            clock.advance(Duration::from_millis(1_500));
            assert_eq!(store.get(1).unwrap(), "a");
        }

        clock.advance(Duration::from_secs(2));
        assert!(store.get(1).is_err());
    }

    #[test]
    fn test_store_touch() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "a".to_string(), Some(2)).unwrap();
        clock.advance(Duration::from_millis(1_500));
        store.touch(1).unwrap();
        clock.advance(Duration::from_millis(1_500));
        assert!(store.contains(1));

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.touch(1), Err(CacheError::NotFound(1)));
    }

    #[test]
    fn test_store_contains_does_not_refresh() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "a".to_string(), Some(2)).unwrap();
        clock.advance(Duration::from_millis(1_500));
        assert!(store.contains(1));
        clock.advance(Duration::from_millis(600));
        assert!(!store.contains(1));
    }

    #[test]
    fn test_store_delete_is_idempotent() {
        let (mut store, _) = store_with_clock();

        store.put(1, "a".to_string(), None).unwrap();
        assert!(store.delete(1));
        assert!(!store.delete(1));
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_delete_group() {
        let (mut store, _) = store_with_clock();
        for key in 1..=10 {
            store.put(key, format!("v{}", key), None).unwrap();
        }

        let removed = store.delete_group(&[2, 4, 6, 42]).unwrap();

        assert_eq!(removed, 3);
        assert_eq!(store.tree().keys(), vec![1, 3, 5, 7, 8, 9, 10]);
        store.tree().validate().unwrap();
    }

    #[test]
    fn test_store_delete_group_empty() {
        let (mut store, _) = store_with_clock();

        assert!(matches!(
            store.delete_group(&[]),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_store_sweep_expired() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "short".to_string(), Some(1)).unwrap();
        store.put(2, "long".to_string(), Some(10)).unwrap();
        store.put(3, "short".to_string(), Some(1)).unwrap();

        clock.advance(Duration::from_secs(1));
        assert_eq!(store.expired_keys(), vec![1, 3]);

        let removed = store.sweep_expired();
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(2).is_ok());
        assert_eq!(store.stats().expired_removed, 2);
    }

    #[test]
    fn test_store_take_expired_reports_keys() {
        let (mut store, clock) = store_with_clock();

        store.put(5, "short".to_string(), Some(1)).unwrap();
        store.put(6, "long".to_string(), Some(10)).unwrap();
        clock.advance(Duration::from_secs(2));

        assert_eq!(store.take_expired(), vec![5]);
        assert!(store.take_expired().is_empty());
        assert_eq!(store.stats().expired_removed, 1);
    }

    #[test]
    fn test_store_sweep_empty_is_noop() {
        let (mut store, _) = store_with_clock();
        assert_eq!(store.sweep_expired(), 0);
        assert!(store.expired_keys().is_empty());
    }

    #[test]
    fn test_store_expired_key_blocks_reinsert_until_swept() {
        let (mut store, clock) = store_with_clock();

        store.put(1, "old".to_string(), Some(1)).unwrap();
        clock.advance(Duration::from_secs(5));

        assert_eq!(
            store.put(1, "new".to_string(), None),
            Err(CacheError::DuplicateKey(1))
        );
        store.sweep_expired();
        store.put(1, "new".to_string(), None).unwrap();
        assert_eq!(store.get(1).unwrap(), "new");
    }

    #[test]
    fn test_store_stats() {
        let (mut store, _) = store_with_clock();

        store.put(1, "value1".to_string(), None).unwrap();
        store.get(1).unwrap(); // hit
        let _ = store.get(2); // miss

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.inserts, 1);
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.tree_height, 1);
    }
}
