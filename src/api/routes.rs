//! API Routes
//!
//! Configures the Axum router: the demo resource behind the cache layer, plus
//! the uncached admin endpoints.

use axum::{
    middleware,
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    create_item_handler, get_item_handler, health_handler, invalidate_group_handler,
    list_items_handler, stats_handler, AppState,
};
use crate::adapter::cache_layer;

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /items` - List items (cached)
/// - `GET /items/:id` - Fetch one item (cached)
/// - `POST /items` - Create an item, invalidating the `items` group
/// - `DELETE /groups/:group` - Invalidate a cache group
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - Response cache: only on the demo resource
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let cached = Router::new()
        .route("/items", get(list_items_handler).post(create_item_handler))
        .route("/items/:id", get(get_item_handler))
        .layer(middleware::from_fn_with_state(state.cache.clone(), cache_layer));

    Router::new()
        .merge(cached)
        .route("/groups/:group", delete(invalidate_group_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
