//! Integration Tests for the cached demo API
//!
//! Tests the full request/response cycle through the caching middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use tree_cache::{
    adapter::{derive_key, CachedResponse},
    api::create_router,
    cache::{CacheStore, ManualClock},
    AppState, ResponseCache,
};

// == Helper Functions ==

fn create_test_state() -> (AppState, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(1_000_000));
    let store = CacheStore::with_clock(30, clock.clone()).into_shared();
    let state = AppState::new(ResponseCache::new(store, 1024 * 1024));
    (state, clock)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

fn cache_marker(response: &Response) -> Option<String> {
    response
        .headers()
        .get("x-cache")
        .map(|v| v.to_str().unwrap().to_string())
}

async fn body_to_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// == Caching Tests ==

#[tokio::test]
async fn test_repeated_get_is_served_from_cache() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    let first = send(&app, "GET", "/items", None).await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(cache_marker(&first).as_deref(), Some("MISS"));
    let first_body = body_to_json(first).await;

    // Same body proves the handler did not run again
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = send(&app, "GET", "/items", None).await;
    assert_eq!(second.status(), StatusCode::OK);
    assert_eq!(cache_marker(&second).as_deref(), Some("HIT"));
    assert_eq!(body_to_json(second).await, first_body);
}

#[tokio::test]
async fn test_query_string_is_part_of_identity() {
    let (state, _) = create_test_state();
    let app = create_router(state.clone());

    send(&app, "GET", "/items", None).await;
    let other = send(&app, "GET", "/items?page=2", None).await;

    assert_eq!(cache_marker(&other).as_deref(), Some("MISS"));
    assert_eq!(state.cache.group_keys("items").await.len(), 2);
}

#[tokio::test]
async fn test_post_invalidates_group() {
    let (state, _) = create_test_state();
    let app = create_router(state.clone());

    let list = send(&app, "GET", "/items", None).await;
    assert_eq!(body_to_json(list).await["items"], serde_json::json!([]));

    let created = send(&app, "POST", "/items", Some(r#"{"name":"widget"}"#)).await;
    assert_eq!(created.status(), StatusCode::CREATED);
    assert!(state.cache.group_keys("items").await.is_empty());

    let list = send(&app, "GET", "/items", None).await;
    assert_eq!(cache_marker(&list).as_deref(), Some("MISS"));
    assert_eq!(body_to_json(list).await["items"], serde_json::json!(["widget"]));
}

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let (state, _) = create_test_state();
    let app = create_router(state.clone());

    let response = send(&app, "GET", "/items/7", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(cache_marker(&response).is_none());
    assert!(state.cache.group_keys("items").await.is_empty());
}

#[tokio::test]
async fn test_expired_response_is_recomputed() {
    let (state, clock) = create_test_state();
    let app = create_router(state.clone());

    send(&app, "GET", "/items", None).await;
    clock.advance(Duration::from_secs(31));

    let response = send(&app, "GET", "/items", None).await;
    assert_eq!(cache_marker(&response).as_deref(), Some("MISS"));

    let again = send(&app, "GET", "/items", None).await;
    assert_eq!(cache_marker(&again).as_deref(), Some("HIT"));
}

#[tokio::test]
async fn test_sliding_expiration_through_reads() {
    let (state, clock) = create_test_state();
    let app = create_router(state);

    send(&app, "GET", "/items", None).await;
    for _ in 0..5 {
        clock.advance(Duration::from_secs(20));
        let response = send(&app, "GET", "/items", None).await;
        assert_eq!(cache_marker(&response).as_deref(), Some("HIT"));
    }
}

#[tokio::test]
async fn test_colliding_key_is_not_replayed_to_other_identity() {
    let (state, _) = create_test_state();
    let app = create_router(state.clone());

    // A response for one identity occupying the key another identity hashes to
    let key = derive_key("GET /items?b");
    let generation = state.cache.generation("items").await;
    let planted = CachedResponse {
        status: StatusCode::OK,
        headers: Default::default(),
        body: "BODY-OF-A".into(),
    };
    state
        .cache
        .remember("items", "GET /items?a", key, generation, planted)
        .await
        .unwrap();

    let response = send(&app, "GET", "/items?b", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(cache_marker(&response).as_deref(), Some("BYPASS"));
    let json = body_to_json(response).await;
    assert_eq!(json["items"], serde_json::json!([]));
}

// == Admin Endpoint Tests ==

#[tokio::test]
async fn test_invalidate_group_endpoint() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    send(&app, "POST", "/items", Some(r#"{"name":"widget"}"#)).await;
    send(&app, "GET", "/items", None).await;
    send(&app, "GET", "/items/0", None).await;

    let response = send(&app, "DELETE", "/groups/items", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response).await;
    assert_eq!(json["group"], "items");
    assert_eq!(json["removed"], 2);

    let item = send(&app, "GET", "/items/0", None).await;
    assert_eq!(cache_marker(&item).as_deref(), Some("MISS"));
}

#[tokio::test]
async fn test_stats_endpoint() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    send(&app, "GET", "/items", None).await; // miss
    send(&app, "GET", "/items", None).await; // hit

    let response = send(&app, "GET", "/stats", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["hits"], 1);
    assert_eq!(json["misses"], 1);
    assert_eq!(json["inserts"], 1);
    assert_eq!(json["total_entries"], 1);
    assert!((json["hit_rate"].as_f64().unwrap() - 0.5).abs() < 0.001);
}

#[tokio::test]
async fn test_health_endpoint() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    let response = send(&app, "GET", "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert!(json.get("timestamp").is_some());
}

// == Error Handling Tests ==

#[tokio::test]
async fn test_invalid_json_request() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    let response = send(&app, "POST", "/items", Some("not valid json")).await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_empty_item_name() {
    let (state, _) = create_test_state();
    let app = create_router(state);

    let response = send(&app, "POST", "/items", Some(r#"{"name":""}"#)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_to_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("empty"));
}
