// src/config.rs
use serde::{Deserialize, Serialize};

/// Pool sizing and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub min_connections: u32,
    pub max_connections: u32,
    pub connection_timeout_ms: u64,
    pub idle_timeout_ms: u64,
    pub statement_timeout_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 10,
            max_connections: 50,
            connection_timeout_ms: 30_000,
            idle_timeout_ms: 10_000,
            statement_timeout_ms: 30_000,
        }
    }
}

/// Bounded-retry backoff parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_backoff_ms: u64,
    pub jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 100,
            jitter_ms: 100,
        }
    }
}

/// Idempotency record lifetime.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct IdempotencyConfig {
    pub ttl_hours: i64,
}

impl Default for IdempotencyConfig {
    fn default() -> Self {
        Self { ttl_hours: 24 }
    }
}

/// Pagination defaults for the History Reader.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub default_limit: i64,
    pub max_limit: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

/// Top-level configuration for the engine, deserializable so the
/// out-of-scope transport layer can load it from environment or file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub pool: PoolConfig,
    pub retry: RetryConfig,
    pub idempotency: IdempotencyConfig,
    pub history: HistoryConfig,
}

impl HistoryConfig {
    pub fn clamp_limit(&self, requested: i64) -> i64 {
        if requested <= 0 {
            self.default_limit
        } else {
            requested.min(self.max_limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_requests_fall_back_to_default_limit() {
        let config = HistoryConfig::default();
        assert_eq!(config.clamp_limit(0), 50);
        assert_eq!(config.clamp_limit(-10), 50);
    }

    #[test]
    fn requests_above_max_are_capped() {
        let config = HistoryConfig::default();
        assert_eq!(config.clamp_limit(1000), 100);
        assert_eq!(config.clamp_limit(10), 10);
    }
}
