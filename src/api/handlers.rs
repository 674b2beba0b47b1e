//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::WriteBehindCache;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{GetResponse, HealthResponse, SetRequest, SetResponse, StatsResponse};
use crate::store::MemoryStore;

/// Cache type served over HTTP.
pub type SharedCache = WriteBehindCache<String, String, MemoryStore<String, String>>;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The write-behind cache
    pub cache: Arc<SharedCache>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the simulated store and starts the cache's background tasks,
    /// so it must run inside a Tokio runtime.
    pub fn from_config(config: &Config) -> Self {
        let store = Arc::new(MemoryStore::with_latency(
            Duration::from_millis(config.store_read_delay_ms),
            Duration::from_millis(config.store_write_delay_ms),
        ));
        Self::new(WriteBehindCache::with_options(store, config.cache_options()))
    }
}

/// Handler for PUT /set
///
/// Queues a key-value pair for writing. Responds 202 once queued; the store
/// write happens in the background.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<(StatusCode, Json<SetResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    state.cache.put(req.key.clone(), req.value).await?;

    Ok((StatusCode::ACCEPTED, Json(SetResponse::new(req.key))))
}

/// Handler for GET /get/:key
///
/// Reads through the cache, falling back to the store on miss or expiry.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await? {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    let entries = state.cache.len().await;

    Json(StatsResponse::new(stats, entries, state.cache.state()))
}

/// Handler for GET /health
///
/// Reports healthy while the cache accepts writes.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::from_state(state.cache.state()))
}
