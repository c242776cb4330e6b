//! API Module
//!
//! HTTP handlers and routing for the demo server.
//!
//! # Endpoints
//! - `GET /items`, `GET /items/:id`, `POST /items` - Demo resource behind the cache
//! - `DELETE /groups/:group` - Invalidate a cache group
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
