//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

use tokio::time::Instant;

// == Cache Entry ==
/// A cached value together with its expiry deadline.
///
/// Entries are replaced wholesale on every write. The `version` is assigned by
/// the entry table and identifies this particular write, so an invalidation can
/// target exactly the entry a reader observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The cached value
    pub value: V,
    /// Instant after which the entry must not be served
    pub expires_at: Instant,
    /// Table-assigned write version
    pub version: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `ttl` from now.
    ///
    /// The version is left at zero; the table stamps it on insert.
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
            version: 0,
        }
    }

    // == Is Expired ==
    /// Checks expiry against the given instant.
    ///
    /// An entry is expired strictly after its deadline: at `expires_at` itself
    /// it is still fresh.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }

    /// Checks expiry against the current instant.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, zero once expired.
    pub fn ttl_remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }
}
