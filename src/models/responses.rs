//! Response DTOs for the demo API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;

/// A single item (GET /items/:id, POST /items)
#[derive(Debug, Clone, Serialize)]
pub struct ItemResponse {
    pub id: usize,
    pub name: String,
    /// When the handler produced this body (Unix milliseconds)
    pub served_at: u64,
}

/// Every item (GET /items)
#[derive(Debug, Clone, Serialize)]
pub struct ItemsResponse {
    pub items: Vec<String>,
    /// When the handler produced this body (Unix milliseconds)
    pub served_at: u64,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Sweep interval in milliseconds
    pub sweep_interval_ms: u64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: CacheStats, sweep_interval_ms: u64) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            stats,
            sweep_interval_ms,
        }
    }
}

/// Response body for group invalidation (DELETE /groups/:group)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub group: String,
    /// Number of cached responses removed
    pub removed: usize,
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_response_flattens_counters() {
        let mut stats = CacheStats::new();
        stats.hits = 8;
        stats.misses = 2;

        let resp = StatsResponse::new(stats, 30_000);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);

        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["hits"], 8);
        assert_eq!(json["misses"], 2);
        assert_eq!(json["sweep_interval_ms"], 30_000);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::new(CacheStats::new(), 30_000);
        assert_eq!(resp.hit_rate, 0.0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
