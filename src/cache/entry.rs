//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with sliding TTL support.

// == Cache Entry ==
/// A single stored value plus its expiry metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// Unique key of the entry in the tree
    pub key: i64,
    /// The stored value
    pub value: V,
    /// Time to live in seconds, measured from `last_refreshed`
    pub ttl_seconds: u64,
    /// Last insert or successful read (Unix milliseconds)
    pub last_refreshed: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped at `now_ms`.
    pub fn new(key: i64, value: V, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            key,
            value,
            ttl_seconds,
            last_refreshed: now_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// Boundary condition: the entry is expired once exactly `ttl_seconds` have
    /// elapsed since the last refresh. A clock that reads earlier than the
    /// refresh stamp never expires the entry.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_refreshed) >= self.ttl_ms()
    }

    // == Touch ==
    /// Restarts the TTL window (sliding expiration).
    pub fn touch(&mut self, now_ms: u64) {
        self.last_refreshed = now_ms;
    }

    /// Returns remaining TTL in milliseconds at `now_ms`, 0 once expired.
    pub fn ttl_remaining_ms(&self, now_ms: u64) -> u64 {
        let deadline = self.last_refreshed.saturating_add(self.ttl_ms());
        deadline.saturating_sub(now_ms)
    }

    fn ttl_ms(&self) -> u64 {
        self.ttl_seconds.saturating_mul(1000)
    }
}
