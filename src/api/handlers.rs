//! API Handlers
//!
//! HTTP request handlers for the admin endpoints and the demo resource.

use std::sync::Arc;
use tokio::sync::RwLock;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::adapter::ResponseCache;
use crate::cache::{current_timestamp_ms, CacheStore};
use crate::config::{Config, DEFAULT_SWEEP_INTERVAL_MS};
use crate::error::{CacheError, Result};
use crate::models::{
    CreateItemRequest, HealthResponse, InvalidateResponse, ItemResponse, ItemsResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// Holds the response cache and the demo resource it fronts.
#[derive(Clone)]
pub struct AppState {
    /// Response cache used by the caching middleware
    pub cache: ResponseCache,
    /// Items served by the demo resource
    pub items: Arc<RwLock<Vec<String>>>,
    /// Sweep interval reported by the stats endpoint
    pub sweep_interval_ms: u64,
}

impl AppState {
    /// Creates a new AppState around the given response cache.
    pub fn new(cache: ResponseCache) -> Self {
        Self {
            cache,
            items: Arc::new(RwLock::new(Vec::new())),
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The sweeper is not started here; see [`crate::tasks::ExpirySweeper`].
    pub fn from_config(config: &Config) -> Self {
        let store = CacheStore::new(config.default_ttl).into_shared();
        let mut state = Self::new(ResponseCache::new(store, config.max_body_bytes));
        state.sweep_interval_ms = config.sweep_interval_ms;
        state
    }
}

/// Handler for GET /items
pub async fn list_items_handler(State(state): State<AppState>) -> Json<ItemsResponse> {
    let items = state.items.read().await;

    Json(ItemsResponse {
        items: items.clone(),
        served_at: current_timestamp_ms(),
    })
}

/// Handler for GET /items/:id
pub async fn get_item_handler(
    State(state): State<AppState>,
    Path(id): Path<usize>,
) -> std::result::Result<Json<ItemResponse>, StatusCode> {
    let items = state.items.read().await;
    let name = items.get(id).ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(ItemResponse {
        id,
        name: name.clone(),
        served_at: current_timestamp_ms(),
    }))
}

/// Handler for POST /items
///
/// Creating an item invalidates every cached `/items` response.
pub async fn create_item_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidArgument(error_msg));
    }

    let mut items = state.items.write().await;
    items.push(req.name.clone());

    Ok((
        StatusCode::CREATED,
        Json(ItemResponse {
            id: items.len() - 1,
            name: req.name,
            served_at: current_timestamp_ms(),
        }),
    ))
}

/// Handler for DELETE /groups/:group
///
/// Drops every cached response of a group. Unknown groups remove nothing.
pub async fn invalidate_group_handler(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Json<InvalidateResponse> {
    let removed = state.cache.invalidate(&group).await;

    Json(InvalidateResponse { group, removed })
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    // Read lock is enough: stats never touch entries
    let stats = state.cache.store().read().await.stats();

    Json(StatsResponse::new(stats, state.sweep_interval_ms))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
