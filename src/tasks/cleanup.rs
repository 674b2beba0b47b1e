//! TTL Cleanup Task
//!
//! Background task that periodically removes expired entries from the table.

use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::EntryTable;

/// Spawns a background task that periodically sweeps expired entries.
///
/// Reads already treat expired entries as absent; the sweep only reclaims
/// memory for keys nobody reads again. The task loops until aborted.
///
/// # Example
/// ```ignore
/// let table = Arc::new(EntryTable::<String, String>::new());
/// let cleanup_handle = spawn_cleanup_task(table.clone(), Duration::from_secs(1));
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task<K, V>(table: Arc<EntryTable<K, V>>, interval: Duration) -> JoinHandle<()>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting TTL cleanup task with interval of {:?}", interval);

        loop {
            tokio::time::sleep(interval).await;

            let removed = table.cleanup_expired().await;
            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
