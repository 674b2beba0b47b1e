//! Cache Module
//!
//! Provides the write-behind, read-through cache: TTL entries, the write
//! queue and the facade that ties them to a backing store.

mod entry;
mod queue;
mod stats;
mod table;
mod write_behind;


// Re-export public types
pub use entry::CacheEntry;
pub use queue::{write_queue, QueueItem, QueueMode, QueueReceiver, WriteQueue};
pub use stats::{CacheStats, StatsRecorder};
pub use table::EntryTable;
pub use write_behind::{CacheOptions, CacheState, WriteBehindCache, DEFAULT_TTL};
