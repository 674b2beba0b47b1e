//! In-memory store with simulated I/O latency.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::store::Store;

/// Default simulated read latency
pub const DEFAULT_READ_DELAY: Duration = Duration::from_millis(50);

/// Default simulated write latency
pub const DEFAULT_WRITE_DELAY: Duration = Duration::from_millis(100);

// == Memory Store ==
/// A [`Store`] backed by a `HashMap`, standing in for a slow database.
///
/// Every call sleeps for the configured latency before touching the map.
/// Read and write counters plus failure switches make it usable as a test
/// double.
#[derive(Debug)]
pub struct MemoryStore<K, V> {
    data: RwLock<HashMap<K, V>>,
    read_delay: Duration,
    write_delay: Duration,
    reads: AtomicU64,
    writes: AtomicU64,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl<K, V> MemoryStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    // == Constructor ==
    /// Creates an empty store with the default latencies.
    pub fn new() -> Self {
        Self::with_latency(DEFAULT_READ_DELAY, DEFAULT_WRITE_DELAY)
    }

    /// Creates an empty store with custom read and write latencies.
    pub fn with_latency(read_delay: Duration, write_delay: Duration) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            read_delay,
            write_delay,
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Writes directly, bypassing latency and counters.
    pub async fn seed(&self, key: K, value: V) {
        self.data.write().await.insert(key, value);
    }

    /// Reads directly, bypassing latency and counters.
    pub async fn peek(&self, key: &K) -> Option<V> {
        self.data.read().await.get(key).cloned()
    }

    /// Number of keys held.
    pub async fn len(&self) -> usize {
        self.data.read().await.len()
    }

    /// Returns true if the store holds no keys.
    pub async fn is_empty(&self) -> bool {
        self.data.read().await.is_empty()
    }

    /// Number of `get` calls served so far.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `put` calls attempted so far.
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Makes subsequent reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl<K, V> Default for MemoryStore<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<K, V> Store<K, V> for MemoryStore<K, V>
where
    K: Eq + Hash + Debug + Send + Sync,
    V: Clone + Send + Sync,
{
    async fn put(&self, key: K, value: V) -> Result<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.write_delay).await;

        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::StoreWrite(format!("write rejected for {:?}", key)));
        }

        debug!("Store updated: {:?}", key);
        self.data.write().await.insert(key, value);
        Ok(())
    }

    async fn get(&self, key: &K) -> Result<Option<V>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.read_delay).await;

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::StoreRead(format!("read rejected for {:?}", key)));
        }

        Ok(self.data.read().await.get(key).cloned())
    }
}
