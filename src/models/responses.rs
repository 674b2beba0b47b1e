//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{CacheState, CacheStats};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The value read through the cache
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
///
/// Acknowledges acceptance only; the store write happens later.
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Acceptance message
    pub message: String,
    /// The key that was queued
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' queued for write", key),
            key,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
    pub store_reads: u64,
    pub refreshes: u64,
    pub refreshes_dropped: u64,
    pub writes_applied: u64,
    pub write_failures: u64,
    pub rejected: u64,
    /// Entries currently held in the table
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Lifecycle state of the cache
    pub state: CacheState,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a stats snapshot
    pub fn new(stats: CacheStats, total_entries: usize, state: CacheState) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            expired: stats.expired,
            store_reads: stats.store_reads,
            refreshes: stats.refreshes,
            refreshes_dropped: stats.refreshes_dropped,
            writes_applied: stats.writes_applied,
            write_failures: stats.write_failures,
            rejected: stats.rejected,
            total_entries,
            state,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// "healthy" while running, otherwise the lifecycle state
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a HealthResponse for the given cache state
    pub fn from_state(state: CacheState) -> Self {
        let status = match state {
            CacheState::Running => "healthy",
            CacheState::Closing => "closing",
            CacheState::Closed => "closed",
        };
        Self {
            status: status.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
