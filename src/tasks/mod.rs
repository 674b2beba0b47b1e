//! Background Tasks Module
//!
//! Long-lived tasks spawned by the cache.
//!
//! # Tasks
//! - Drain worker: applies queued writes to the table and store, in order
//! - TTL cleanup: removes expired entries at a configured interval

mod cleanup;
mod drain;

pub use cleanup::spawn_cleanup_task;
pub use drain::spawn_drain_worker;
