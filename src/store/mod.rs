//! Store Module
//!
//! The authoritative, slower backend the cache sits in front of.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;

// == Store Trait ==
/// Async key-value backend.
///
/// Failures are reported as [`CacheError::StoreRead`] and
/// [`CacheError::StoreWrite`].
///
/// [`CacheError::StoreRead`]: crate::error::CacheError::StoreRead
/// [`CacheError::StoreWrite`]: crate::error::CacheError::StoreWrite
#[async_trait]
pub trait Store<K, V>: Send + Sync {
    /// Durably writes `value` under `key`.
    async fn put(&self, key: K, value: V) -> Result<()>;

    /// Reads the value under `key`, `None` if the store has nothing.
    async fn get(&self, key: &K) -> Result<Option<V>>;
}
