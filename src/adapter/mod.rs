//! HTTP Adapter Module
//!
//! Sits in front of request handlers and decides what to cache. It turns
//! responses into stored payloads, derives integer keys from requests and
//! keeps the group-to-keys mapping used for batch invalidation. The cache
//! store itself knows nothing about HTTP.

mod keys;
mod middleware;

pub use keys::{derive_key, group_of, GroupIndex};
pub use middleware::{cache_layer, CachedResponse, ResponseCache, X_CACHE};
