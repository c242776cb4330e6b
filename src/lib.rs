//! Tree Cache - An in-process cache indexed by an AVL tree
//!
//! Stores payloads under integer keys with per-entry sliding TTLs, supports
//! batch (group) invalidation and a background expiry sweep. An axum
//! middleware adapter caches HTTP responses on top of the store.

pub mod adapter;
pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use adapter::ResponseCache;
pub use api::AppState;
pub use cache::{CacheStore, SharedStore};
pub use config::Config;
pub use error::{CacheError, Result};
pub use tasks::ExpirySweeper;
