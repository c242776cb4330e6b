//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL applied to entries inserted without an explicit TTL, in seconds.
pub const DEFAULT_TTL_SECS: u64 = 30;

/// Default period between expiry sweeps, in milliseconds.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 30_000;

/// Largest response body the HTTP adapter will store.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024; // 1 MB

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Default TTL in seconds for entries without explicit TTL
    pub default_ttl: u64,
    /// Expiry sweep interval in milliseconds
    pub sweep_interval_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Maximum response body size the adapter caches
    pub max_body_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 30)
    /// - `SWEEP_INTERVAL_MS` - Sweep frequency in milliseconds (default: 30000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `MAX_BODY_BYTES` - Largest cacheable response body (default: 1 MB)
    ///
    /// Zero values for the TTL or the interval fall back to the defaults.
    pub fn from_env() -> Self {
        Self {
            default_ttl: env_var::<u64>("DEFAULT_TTL")
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_TTL_SECS),
            sweep_interval_ms: env_var::<u64>("SWEEP_INTERVAL_MS")
                .filter(|v| *v > 0)
                .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS),
            server_port: env_var("SERVER_PORT").unwrap_or(3000),
            max_body_bytes: env_var("MAX_BODY_BYTES").unwrap_or(DEFAULT_MAX_BODY_BYTES),
        }
    }

    /// Sweep interval as a `Duration`.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_TTL_SECS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            server_port: 3000,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

fn env_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}
