//! Error types for the write-behind cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache and its store collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The write queue no longer accepts items (shutdown has begun)
    #[error("Write queue is closed")]
    QueueClosed,

    /// A bounded write queue has no room and the caller chose not to wait
    #[error("Write queue is full")]
    QueueFull,

    /// The backing store failed to answer a read
    #[error("Store read failed: {0}")]
    StoreRead(String),

    /// The backing store failed to apply a write
    #[error("Store write failed: {0}")]
    StoreWrite(String),

    /// Key not found in cache nor store
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::QueueClosed | CacheError::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
            CacheError::StoreRead(_) | CacheError::StoreWrite(_) => StatusCode::BAD_GATEWAY,
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
