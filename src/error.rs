//! Error types for the tree cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its HTTP surface.
///
/// Every variant is recoverable at the call site; none is retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Insert attempted on a key that is already present
    #[error("Duplicate keys not allowed. Key = {0}")]
    DuplicateKey(i64),

    /// Key absent, or present but past its TTL
    #[error("Key not found: {0}")]
    NotFound(i64),

    /// Structural operation attempted on a tree that holds no nodes
    #[error("Tree is empty")]
    EmptyStore,

    /// Bad input, e.g. an empty key batch or a zero TTL
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::DuplicateKey(_) => StatusCode::CONFLICT,
            CacheError::NotFound(_) | CacheError::EmptyStore => StatusCode::NOT_FOUND,
            CacheError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            CacheError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the tree cache.
pub type Result<T> = std::result::Result<T, CacheError>;
