//! Write Behind - A write-behind, read-through TTL cache
//!
//! Serves recently used values from memory with time-based invalidation and
//! applies writes to a slow backing store through a single background worker.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheOptions, CacheState, WriteBehindCache};
pub use config::Config;
pub use error::{CacheError, Result};
pub use store::{MemoryStore, Store};
