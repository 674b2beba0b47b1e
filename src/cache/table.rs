//! Entry Table Module
//!
//! Concurrent key to entry mapping with TTL-aware lookups and
//! compare-and-delete invalidation.

use std::collections::HashMap;
use std::hash::Hash;

use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::cache::CacheEntry;

// == Entry Table ==
/// Shared mapping from key to [`CacheEntry`].
///
/// Reads take a shared lock and clone the entry out; the drain worker is the
/// only caller of [`EntryTable::store`]. Readers may remove entries but never
/// insert them.
#[derive(Debug)]
pub struct EntryTable<K, V> {
    inner: RwLock<TableInner<K, V>>,
}

#[derive(Debug)]
struct TableInner<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    next_version: u64,
}

impl<K, V> EntryTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty table.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(TableInner {
                entries: HashMap::new(),
                next_version: 1,
            }),
        }
    }

    // == Lookup ==
    /// Returns a copy of the entry for `key`, expired or not.
    ///
    /// Callers decide freshness so they can invalidate the exact entry they saw.
    pub async fn lookup(&self, key: &K) -> Option<CacheEntry<V>> {
        self.inner.read().await.entries.get(key).cloned()
    }

    // == Store ==
    /// Inserts or replaces the entry for `key`, last write wins.
    ///
    /// Returns the version stamped on the stored entry.
    pub async fn store(&self, key: K, mut entry: CacheEntry<V>) -> u64 {
        let mut inner = self.inner.write().await;
        let version = inner.next_version;
        inner.next_version += 1;
        entry.version = version;
        inner.entries.insert(key, entry);
        version
    }

    // == Invalidate If ==
    /// Removes the entry for `key` only if it is still the observed `version`.
    ///
    /// Returns `true` when an entry was removed. A newer write stored after the
    /// observation is left untouched.
    pub async fn invalidate_if(&self, key: &K, version: u64) -> bool {
        let mut inner = self.inner.write().await;
        match inner.entries.get(key) {
            Some(current) if current.version == version => {
                inner.entries.remove(key);
                true
            }
            _ => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all entries expired at the time of the sweep.
    ///
    /// Expiry is re-checked under the write lock, so an entry refreshed
    /// concurrently is never dropped. Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut inner = self.inner.write().await;
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| !entry.is_expired_at(now));
        before - inner.entries.len()
    }

    // == Length ==
    /// Returns the number of entries, including expired ones not yet removed.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    // == Is Empty ==
    /// Returns true if the table holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.entries.is_empty()
    }
}

impl<K, V> Default for EntryTable<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
