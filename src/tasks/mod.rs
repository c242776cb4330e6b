//! Background Tasks Module
//!
//! Contains background tasks that run alongside the cache.
//!
//! # Tasks
//! - Expiry sweep: Removes expired cache entries at a configured interval

mod sweeper;

pub use sweeper::{ExpirySweeper, Sweep};
