//! Write-Behind Cache Module
//!
//! Facade combining the entry table, write queue and drain worker into a
//! read-through, write-behind cache in front of a [`Store`].

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::{
    write_queue, CacheStats, EntryTable, QueueItem, QueueMode, StatsRecorder, WriteQueue,
};
use crate::error::Result;
use crate::store::Store;
use crate::tasks::{spawn_cleanup_task, spawn_drain_worker};

/// Default entry lifetime
pub const DEFAULT_TTL: Duration = Duration::from_secs(5);

// == Cache Options ==
/// Construction parameters for [`WriteBehindCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheOptions {
    /// Lifetime of an entry after it is written or refreshed
    pub ttl: Duration,
    /// Capacity policy of the write queue
    pub queue_mode: QueueMode,
    /// Period of the background expiry sweep, `None` to disable
    pub cleanup_interval: Option<Duration>,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_TTL,
            queue_mode: QueueMode::Unbounded,
            cleanup_interval: None,
        }
    }
}

// == Cache State ==
/// Lifecycle of the cache. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Accepting writes
    Running,
    /// Queue closed, worker draining what is left
    Closing,
    /// Worker has exited, every accepted write was applied
    Closed,
}

// == Write-Behind Cache ==
/// Read-through, write-behind TTL cache.
///
/// `put` only enqueues; a single background worker applies writes to the
/// table and the store in FIFO order. `get` serves fresh entries from the
/// table and otherwise falls back to the store, enqueueing a refresh.
///
/// Must be created inside a Tokio runtime. Dropping the cache without
/// calling [`close`](Self::close) still lets the worker drain the queue.
pub struct WriteBehindCache<K, V, S> {
    table: Arc<EntryTable<K, V>>,
    queue: WriteQueue<K, V>,
    store: Arc<S>,
    stats: Arc<StatsRecorder>,
    state: Arc<watch::Sender<CacheState>>,
    cleanup: Mutex<Option<JoinHandle<()>>>,
    ttl: Duration,
}

impl<K, V, S> WriteBehindCache<K, V, S>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: Store<K, V> + 'static,
{
    // == Constructor ==
    /// Creates a cache over `store` with an unbounded queue and no sweeper.
    pub fn new(store: Arc<S>, ttl: Duration) -> Self {
        Self::with_options(
            store,
            CacheOptions {
                ttl,
                ..CacheOptions::default()
            },
        )
    }

    /// Creates a cache and starts its background tasks.
    pub fn with_options(store: Arc<S>, options: CacheOptions) -> Self {
        let (queue, receiver) = write_queue(options.queue_mode);
        let table = Arc::new(EntryTable::new());
        let stats = Arc::new(StatsRecorder::new());
        let (state, _) = watch::channel(CacheState::Running);
        let state = Arc::new(state);

        spawn_drain_worker(
            receiver,
            table.clone(),
            store.clone(),
            options.ttl,
            stats.clone(),
            state.clone(),
        );
        let cleanup = options
            .cleanup_interval
            .filter(|interval| !interval.is_zero())
            .map(|interval| spawn_cleanup_task(table.clone(), interval));

        Self {
            table,
            queue,
            store,
            stats,
            state,
            cleanup: Mutex::new(cleanup),
            ttl: options.ttl,
        }
    }

    // == Put ==
    /// Accepts a write for asynchronous application.
    ///
    /// Success means the write is queued, not that the store holds it.
    /// Fails with [`CacheError::QueueClosed`](crate::error::CacheError::QueueClosed)
    /// once shutdown has closed the queue.
    pub async fn put(&self, key: K, value: V) -> Result<()> {
        if let Err(err) = self.queue.send(QueueItem::new(key.clone(), value)).await {
            self.stats.record_rejected();
            debug!("Rejected write for {:?}: {}", key, err);
            return Err(err);
        }
        Ok(())
    }

    // == Get ==
    /// Reads `key`, falling back to the store when the cached entry is
    /// missing or expired.
    ///
    /// A value found in the store is returned immediately and offered to the
    /// queue as a refresh without waiting: when the queue is full or closed
    /// the refresh is dropped. Store read failures propagate to the caller.
    ///
    /// The refresh is written back to the store like any other write, so a
    /// `put` for the same key that reaches the store between this read and
    /// the refresh is overwritten by the value read here.
    pub async fn get(&self, key: &K) -> Result<Option<V>> {
        if let Some(entry) = self.table.lookup(key).await {
            if !entry.is_expired() {
                self.stats.record_hit();
                debug!("Cache hit: {:?}", key);
                return Ok(Some(entry.value));
            }

            self.stats.record_expired();
            debug!("Cache expired: {:?}", key);
            self.table.invalidate_if(key, entry.version).await;
        }

        self.stats.record_miss();
        self.stats.record_store_read();
        debug!("Cache miss: {:?}", key);

        let value = self.store.get(key).await.map_err(|err| {
            warn!("Store read failed for {:?}: {}", key, err);
            err
        })?;

        if let Some(value) = &value {
            match self.queue.try_send(QueueItem::new(key.clone(), value.clone())) {
                Ok(()) => {
                    self.stats.record_refresh();
                    debug!("Store fallback: {:?} -> refresh enqueued", key);
                }
                Err(err) => {
                    self.stats.record_refresh_dropped();
                    debug!("Store fallback: {:?} -> refresh skipped: {}", key, err);
                }
            }
        }

        Ok(value)
    }

    // == Close ==
    /// Shuts the cache down without losing accepted writes.
    ///
    /// Waits `grace` while still accepting writes, closes the queue, then
    /// waits until the drain worker has applied every queued item and exited.
    /// The worker itself publishes [`CacheState::Closed`], so a `close` that is
    /// cancelled part way leaves the drain running and any later `close`
    /// returns once it finishes. Calls after that return immediately.
    pub async fn close(&self, grace: Duration) {
        if self.state() == CacheState::Running && !grace.is_zero() {
            info!("Closing write queue in {:?}", grace);
            tokio::time::sleep(grace).await;
        }

        if self.queue.close().await {
            self.state.send_if_modified(|state| {
                if *state == CacheState::Running {
                    *state = CacheState::Closing;
                    true
                } else {
                    false
                }
            });
            info!("Write queue closed, draining pending writes");
        }

        let mut state = self.state.subscribe();
        let _ = state.wait_for(|state| *state == CacheState::Closed).await;

        if let Some(handle) = self.cleanup.lock().await.take() {
            handle.abort();
        }
    }

    // == Accessors ==
    /// Current lifecycle state.
    pub fn state(&self) -> CacheState {
        *self.state.borrow()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot()
    }

    /// Number of entries held, including expired ones not yet removed.
    pub async fn len(&self) -> usize {
        self.table.len().await
    }

    /// Returns true if the table holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.table.is_empty().await
    }

    /// Lifetime applied to every written entry.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<K, V, S> Drop for WriteBehindCache<K, V, S> {
    fn drop(&mut self) {
        if let Some(handle) = self.cleanup.get_mut().take() {
            handle.abort();
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::store::MemoryStore;

    type TestCache = WriteBehindCache<String, String, MemoryStore<String, String>>;

    fn create_cache(ttl: Duration) -> (TestCache, Arc<MemoryStore<String, String>>) {
        let store = Arc::new(MemoryStore::new());
        (WriteBehindCache::new(store.clone(), ttl), store)
    }

    fn key(k: &str) -> String {
        k.to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_returns_before_store_write() {
        let (cache, store) = create_cache(DEFAULT_TTL);

        cache.put(key("k"), key("v")).await.unwrap();

        assert_eq!(store.peek(&key("k")).await, None, "write is applied later");
        cache.close(Duration::ZERO).await;
        assert_eq!(store.peek(&key("k")).await, Some(key("v")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_hit_after_worker_applies() {
        let (cache, store) = create_cache(DEFAULT_TTL);

        cache.put(key("k"), key("v")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(cache.get(&key("k")).await.unwrap(), Some(key("v")));
        assert_eq!(store.reads(), 0);
        assert_eq!(cache.stats().hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_absent_everywhere() {
        let (cache, store) = create_cache(DEFAULT_TTL);

        assert_eq!(cache.get(&key("missing")).await.unwrap(), None);
        assert_eq!(store.reads(), 1);

        let stats = cache.stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.refreshes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_propagates_store_read_failure() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        store.set_fail_reads(true);

        let result = cache.get(&key("k")).await;
        assert!(matches!(result, Err(CacheError::StoreRead(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_enqueues_refresh() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        store.seed(key("k"), key("from_store")).await;

        assert_eq!(cache.get(&key("k")).await.unwrap(), Some(key("from_store")));
        assert_eq!(cache.stats().refreshes, 1);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.get(&key("k")).await.unwrap(), Some(key("from_store")));
        assert_eq!(store.reads(), 1, "refreshed entry is served from the table");
    }

    #[tokio::test(start_paused = true)]
    async fn test_state_transitions() {
        let (cache, _store) = create_cache(DEFAULT_TTL);
        assert_eq!(cache.state(), CacheState::Running);

        cache.close(Duration::ZERO).await;
        assert_eq!(cache.state(), CacheState::Closed);

        // Closing again is a no-op
        cache.close(Duration::from_secs(10)).await;
        assert_eq!(cache.state(), CacheState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_rejected_after_close() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        cache.close(Duration::ZERO).await;

        assert_eq!(
            cache.put(key("late"), key("v")).await,
            Err(CacheError::QueueClosed)
        );
        assert_eq!(cache.stats().rejected, 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_completes_after_cancelled_close() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        for i in 0..5 {
            cache.put(format!("k{}", i), format!("v{}", i)).await.unwrap();
        }

        let first =
            tokio::time::timeout(Duration::from_millis(10), cache.close(Duration::ZERO)).await;
        assert!(first.is_err(), "five 100ms writes cannot drain in 10ms");
        assert_eq!(cache.state(), CacheState::Closing);
        assert_eq!(
            cache.put(key("late"), key("v")).await,
            Err(CacheError::QueueClosed)
        );

        let second =
            tokio::time::timeout(Duration::from_secs(3600), cache.close(Duration::ZERO)).await;
        assert!(second.is_ok(), "second close must return once the drain ends");
        assert_eq!(cache.state(), CacheState::Closed);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_marks_closed_without_waiting_close() {
        let (cache, _store) = create_cache(DEFAULT_TTL);
        cache.put(key("k"), key("v")).await.unwrap();

        drop(tokio::time::timeout(Duration::from_millis(1), cache.close(Duration::ZERO)).await);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(cache.state(), CacheState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_refresh_does_not_wait_for_store_writes() {
        let store = Arc::new(MemoryStore::with_latency(
            Duration::from_millis(50),
            Duration::from_secs(10),
        ));
        let cache: TestCache = WriteBehindCache::with_options(
            store.clone(),
            CacheOptions {
                ttl: DEFAULT_TTL,
                queue_mode: QueueMode::Bounded(1),
                cleanup_interval: None,
            },
        );
        store.seed(key("seeded"), key("x")).await;

        // One write in flight at the store, one filling the queue
        cache.put(key("a"), key("1")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        cache.put(key("b"), key("2")).await.unwrap();

        let start = tokio::time::Instant::now();
        assert_eq!(cache.get(&key("seeded")).await.unwrap(), Some(key("x")));
        assert!(start.elapsed() < Duration::from_secs(1));

        let stats = cache.stats();
        assert_eq!(stats.refreshes, 0);
        assert_eq!(stats.refreshes_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_accepted_during_grace_period() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        let cache = Arc::new(cache);

        let closer = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.close(Duration::from_secs(1)).await })
        };
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(cache.state(), CacheState::Running);
        cache.put(key("in_grace"), key("v")).await.unwrap();

        closer.await.unwrap();
        assert_eq!(store.peek(&key("in_grace")).await, Some(key("v")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_close_waits_for_drain() {
        let (cache, store) = create_cache(DEFAULT_TTL);
        let cache = Arc::new(cache);
        for i in 0..5 {
            cache.put(format!("k{}", i), format!("v{}", i)).await.unwrap();
        }

        let first = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.close(Duration::ZERO).await })
        };
        let second = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.close(Duration::ZERO).await })
        };
        first.await.unwrap();
        second.await.unwrap();

        assert_eq!(cache.state(), CacheState::Closed);
        assert_eq!(store.len().await, 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_interval_sweeps_table() {
        let store = Arc::new(MemoryStore::new());
        let cache: TestCache = WriteBehindCache::with_options(
            store,
            CacheOptions {
                ttl: Duration::from_secs(1),
                queue_mode: QueueMode::Unbounded,
                cleanup_interval: Some(Duration::from_secs(1)),
            },
        );

        cache.put(key("k"), key("v")).await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(cache.len().await, 1);

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(cache.is_empty().await);
    }
}
