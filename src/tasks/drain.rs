//! Drain Worker
//!
//! The single background task that applies queued writes to the entry table
//! and the backing store, one item at a time.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::{CacheEntry, CacheState, EntryTable, QueueReceiver, StatsRecorder};
use crate::store::Store;

/// Publishes [`CacheState::Closed`] when the worker task ends, whether it
/// drained normally, panicked or was dropped unpolled.
struct ClosedOnExit(Arc<watch::Sender<CacheState>>);

impl Drop for ClosedOnExit {
    fn drop(&mut self) {
        if std::thread::panicking() {
            error!("Drain worker panicked");
        }
        self.0.send_replace(CacheState::Closed);
    }
}

/// Spawns the drain worker.
///
/// For each item, in the order received: stamp a fresh entry expiring `ttl`
/// from now into the table, then await the store write before taking the next
/// item. A failed store write is logged and counted, never retried, and does
/// not stop the loop. The task exits once the queue is closed and empty,
/// and only then moves `state` to [`CacheState::Closed`].
///
/// # Arguments
/// * `receiver` - Consumer side of the write queue
/// * `table` - Shared entry table
/// * `store` - Backing store, written only from this task
/// * `ttl` - Lifetime of every entry written
/// * `stats` - Shared counters
/// * `state` - Lifecycle state, set to `Closed` on exit
pub fn spawn_drain_worker<K, V, S>(
    mut receiver: QueueReceiver<K, V>,
    table: Arc<EntryTable<K, V>>,
    store: Arc<S>,
    ttl: Duration,
    stats: Arc<StatsRecorder>,
    state: Arc<watch::Sender<CacheState>>,
) -> JoinHandle<()>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    S: Store<K, V> + 'static,
{
    let closed_on_exit = ClosedOnExit(state);

    tokio::spawn(async move {
        let _closed_on_exit = closed_on_exit;
        info!("Drain worker started with ttl of {:?}", ttl);

        let mut processed: u64 = 0;
        while let Some(item) = receiver.recv().await {
            table
                .store(item.key.clone(), CacheEntry::new(item.value.clone(), ttl))
                .await;

            match store.put(item.key.clone(), item.value).await {
                Ok(()) => {
                    stats.record_write_applied();
                    debug!("Worker processed: {:?}", item.key);
                }
                Err(err) => {
                    stats.record_write_failure();
                    error!("Dropping write for {:?}: {}", item.key, err);
                }
            }
            processed += 1;
        }

        info!("Drain worker exiting after {} items, shutdown complete", processed);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{write_queue, QueueItem, QueueMode};
    use crate::store::MemoryStore;

    const TTL: Duration = Duration::from_secs(5);

    fn running_state() -> Arc<watch::Sender<CacheState>> {
        Arc::new(watch::channel(CacheState::Running).0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_applies_items_in_order() {
        let (queue, receiver) = write_queue(QueueMode::Unbounded);
        let table = Arc::new(EntryTable::new());
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(StatsRecorder::new());

        let state = running_state();
        let handle = spawn_drain_worker(
            receiver,
            table.clone(),
            store.clone(),
            TTL,
            stats.clone(),
            state.clone(),
        );

        queue.send(QueueItem::new("k", "a")).await.unwrap();
        queue.send(QueueItem::new("k", "b")).await.unwrap();
        queue.send(QueueItem::new("j", "c")).await.unwrap();
        queue.close().await;
        handle.await.unwrap();

        assert_eq!(store.peek(&"k").await, Some("b"));
        assert_eq!(store.peek(&"j").await, Some("c"));
        assert_eq!(table.lookup(&"k").await.unwrap().value, "b");
        assert_eq!(stats.snapshot().writes_applied, 3);
        assert_eq!(*state.borrow(), CacheState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_continues_after_store_failure() {
        let (queue, receiver) = write_queue(QueueMode::Unbounded);
        let table = Arc::new(EntryTable::new());
        let store = Arc::new(MemoryStore::new());
        let stats = Arc::new(StatsRecorder::new());
        store.set_fail_writes(true);

        let state = running_state();
        let handle = spawn_drain_worker(
            receiver,
            table.clone(),
            store.clone(),
            TTL,
            stats.clone(),
            state.clone(),
        );

        queue.send(QueueItem::new("lost", 1)).await.unwrap();
        // Let the first write fail before the store recovers
        tokio::time::sleep(Duration::from_millis(150)).await;
        store.set_fail_writes(false);
        queue.send(QueueItem::new("kept", 2)).await.unwrap();
        queue.close().await;
        handle.await.unwrap();

        assert_eq!(store.peek(&"lost").await, None);
        assert_eq!(store.peek(&"kept").await, Some(2));
        assert_eq!(store.writes(), 2, "failed write is not retried");

        let stats = stats.snapshot();
        assert_eq!(stats.write_failures, 1);
        assert_eq!(stats.writes_applied, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_exits_when_queue_dropped() {
        let (queue, receiver) = write_queue::<&str, i32>(QueueMode::Unbounded);
        let state = running_state();
        let handle = spawn_drain_worker(
            receiver,
            Arc::new(EntryTable::new()),
            Arc::new(MemoryStore::new()),
            TTL,
            Arc::new(StatsRecorder::new()),
            state.clone(),
        );

        drop(queue);
        handle.await.unwrap();
        assert_eq!(*state.borrow(), CacheState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_aborted_worker_still_marks_closed() {
        let (queue, receiver) = write_queue::<&str, i32>(QueueMode::Unbounded);
        let state = running_state();
        let handle = spawn_drain_worker(
            receiver,
            Arc::new(EntryTable::new()),
            Arc::new(MemoryStore::new()),
            TTL,
            Arc::new(StatsRecorder::new()),
            state.clone(),
        );

        handle.abort();
        assert!(handle.await.unwrap_err().is_cancelled());
        assert_eq!(*state.borrow(), CacheState::Closed);
        drop(queue);
    }
}
