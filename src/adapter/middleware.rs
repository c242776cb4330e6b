//! Response caching middleware.
//!
//! Safe requests are answered from the cache when possible; unsafe requests
//! invalidate every cached response of their group once handled.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes, HttpBody},
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::keys::{derive_key, group_of, GroupIndex};
use crate::cache::SharedStore;
use crate::error::{CacheError, Result};
use crate::tasks::Sweep;

/// Header telling clients whether a response was replayed.
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

// == Cached Response ==
/// A response captured for replay.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CachedResponse {
    /// Rebuilds an HTTP response, tagged with `x-cache: <marker>`.
    pub fn to_response(&self, marker: &'static str) -> Response {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
            .headers_mut()
            .insert(X_CACHE.clone(), HeaderValue::from_static(marker));
        response
    }
}

// == Response Cache ==
/// State shared by the caching middleware.
///
/// Lock order is groups first, then store.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: SharedStore<CachedResponse>,
    groups: Arc<Mutex<GroupIndex>>,
    max_body_bytes: usize,
}

impl ResponseCache {
    pub fn new(store: SharedStore<CachedResponse>, max_body_bytes: usize) -> Self {
        Self {
            store,
            groups: Arc::new(Mutex::new(GroupIndex::new())),
            max_body_bytes,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &SharedStore<CachedResponse> {
        &self.store
    }

    /// Fetches the live response stored for `identity` under `key`,
    /// refreshing its TTL.
    ///
    /// A key registered for another identity is a miss.
    pub async fn lookup(&self, key: i64, identity: &str) -> Option<CachedResponse> {
        let groups = self.groups.lock().await;
        if !groups.owns(key, identity) {
            return None;
        }

        self.store.write().await.get(key).ok()
    }

    /// Generation of `group` to pass to [`ResponseCache::remember`].
    ///
    /// Take it before computing the response.
    pub async fn generation(&self, group: &str) -> u64 {
        self.groups.lock().await.generation(group)
    }

    /// Stores a response under `key` and records it in `group`.
    ///
    /// Returns `Ok(false)` without storing if `group` was invalidated after
    /// `generation` was taken. A live entry already stored for the same
    /// identity is kept; a stale one still occupying the key is replaced.
    /// Fails with `DuplicateKey` if the key belongs to a different identity.
    pub async fn remember(
        &self,
        group: &str,
        identity: &str,
        key: i64,
        generation: u64,
        response: CachedResponse,
    ) -> Result<bool> {
        let mut groups = self.groups.lock().await;
        if !groups.is_free_for(key, identity) {
            return Err(CacheError::DuplicateKey(key));
        }
        if !groups.is_current(group, generation) {
            return Ok(false);
        }

        {
            let mut store = self.store.write().await;
            match store.put(key, response.clone(), None) {
                Err(CacheError::DuplicateKey(_)) if store.contains(key) => {}
                Err(CacheError::DuplicateKey(_)) => {
                    store.delete(key);
                    store.put(key, response, None)?;
                }
                other => other?,
            }
        }

        groups.register(group, key, identity);
        Ok(true)
    }

    /// Drops every cached response of `group`, returning how many were removed.
    pub async fn invalidate(&self, group: &str) -> usize {
        let mut groups = self.groups.lock().await;
        let keys = groups.take_group(group);
        if keys.is_empty() {
            return 0;
        }

        self.store.write().await.delete_group(&keys).unwrap_or(0)
    }

    /// Removes expired responses and forgets their keys.
    pub async fn sweep_expired(&self) -> usize {
        let mut groups = self.groups.lock().await;
        let removed = self.store.write().await.take_expired();
        groups.forget(&removed);
        removed.len()
    }

    /// Keys currently recorded for `group`.
    pub async fn group_keys(&self, group: &str) -> Vec<i64> {
        self.groups.lock().await.keys(group)
    }

    /// Number of keys tracked across all groups.
    pub async fn tracked_keys(&self) -> usize {
        self.groups.lock().await.len()
    }
}

impl Sweep for ResponseCache {
    async fn sweep(&self) -> usize {
        self.sweep_expired().await
    }
}

fn is_cacheable(method: &Method) -> bool {
    method == Method::GET || method == Method::HEAD
}

fn invalidates(method: &Method) -> bool {
    method == Method::POST
        || method == Method::PUT
        || method == Method::PATCH
        || method == Method::DELETE
}

/// Cache identity of a request: method plus path and query.
fn request_identity(request: &Request) -> String {
    let target = request
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| request.uri().path());
    format!("{} {}", request.method(), target)
}

// == Middleware ==
/// Axum middleware answering safe requests from the cache.
///
/// Use with `axum::middleware::from_fn_with_state`. Responses are buffered
/// in full before being stored, except those whose body is known to exceed
/// the size limit up front; these stream through uncached.
pub async fn cache_layer(
    State(cache): State<ResponseCache>,
    request: Request,
    next: Next,
) -> Response {
    let Some(group) = group_of(request.uri().path()).map(str::to_string) else {
        return next.run(request).await;
    };

    if !is_cacheable(request.method()) {
        let mutating = invalidates(request.method());
        let response = next.run(request).await;
        if mutating {
            let removed = cache.invalidate(&group).await;
            debug!(group = %group, removed, "Invalidated cache group");
        }
        return response;
    }

    let identity = request_identity(&request);
    let key = derive_key(&identity);

    if let Some(hit) = cache.lookup(key, &identity).await {
        debug!(key, identity = %identity, "Cache hit");
        return hit.to_response("HIT");
    }

    let generation = cache.generation(&group).await;
    let response = next.run(request).await;
    if !response.status().is_success() {
        return response;
    }

    if response.body().size_hint().lower() > cache.max_body_bytes as u64 {
        debug!(key, "Response too large to cache");
        return with_marker(response, "BYPASS");
    }

    let (parts, body) = response.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(err) => {
            warn!("Failed to buffer response body: {}", err);
            let mut response = Response::new(Body::empty());
            *response.status_mut() = StatusCode::BAD_GATEWAY;
            return response;
        }
    };

    let cached = CachedResponse {
        status: parts.status,
        headers: parts.headers,
        body,
    };

    if cached.body.len() > cache.max_body_bytes {
        debug!(key, size = cached.body.len(), "Response too large to cache");
        return cached.to_response("BYPASS");
    }

    match cache
        .remember(&group, &identity, key, generation, cached.clone())
        .await
    {
        Ok(true) => cached.to_response("MISS"),
        Ok(false) => {
            debug!(group = %group, "Group invalidated while response was computed");
            cached.to_response("BYPASS")
        }
        Err(err) => {
            warn!(identity = %identity, "Response not cached: {}", err);
            cached.to_response("BYPASS")
        }
    }
}

fn with_marker(mut response: Response, marker: &'static str) -> Response {
    response
        .headers_mut()
        .insert(X_CACHE.clone(), HeaderValue::from_static(marker));
    response
}
