//! Engine configuration.
//!
//! Every tunable has a constant default here; the application may override
//! any subset from its embedded TOML file. Missing fields keep the default.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// =============================================================================
// Defaults
// =============================================================================

/// Directory listings kept in memory before least-recently-viewed eviction.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Estimated listing row height in CSS pixels.
pub const DEFAULT_ROW_HEIGHT: f64 = 40.0;

/// Rows rendered beyond each edge of the viewport.
pub const DEFAULT_OVERSCAN: usize = 5;

/// Live-update reconnect backoff defaults (milliseconds).
pub mod backoff {
    pub const INITIAL_MS: u64 = 1_000;
    pub const MAX_MS: u64 = 60_000;
    pub const MULTIPLIER: f64 = 2.0;
}

/// Interval between keepalive pings while connected.
pub const DEFAULT_HEARTBEAT_MS: u64 = 30_000;

// =============================================================================
// Config Types
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub cache: CacheConfig,
    pub viewport: ViewportConfig,
    pub live: LiveConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached directories.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub row_height: f64,
    pub overscan: usize,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            row_height: DEFAULT_ROW_HEIGHT,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub heartbeat_ms: u64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: backoff::INITIAL_MS,
            max_backoff_ms: backoff::MAX_MS,
            backoff_multiplier: backoff::MULTIPLIER,
            heartbeat_ms: DEFAULT_HEARTBEAT_MS,
        }
    }
}

impl LiveConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.heartbeat_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override_keeps_defaults() {
        let config: ExplorerConfig =
            serde_json::from_str(r#"{"cache": {"capacity": 8}, "viewport": {"overscan": 2}}"#)
                .unwrap();
        assert_eq!(config.cache.capacity, 8);
        assert_eq!(config.viewport.overscan, 2);
        assert_eq!(config.viewport.row_height, DEFAULT_ROW_HEIGHT);
        assert_eq!(config.live, LiveConfig::default());
    }
}
