//! Cache Module
//!
//! Provides the AVL-indexed entry store with sliding TTL expiration.

mod clock;
mod entry;
mod stats;
mod store;
mod tree;


// Re-export public types
pub use clock::{current_timestamp_ms, Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub use store::{CacheStore, SharedStore};
pub use tree::{AvlTree, Query};
