//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{CacheOptions, QueueMode};

/// Cache and server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Seconds an entry stays valid after being written or refreshed
    pub ttl_secs: u64,
    /// Milliseconds `close` waits before it stops accepting writes
    pub close_grace_ms: u64,
    /// Write queue capacity, 0 = unbounded
    pub queue_capacity: usize,
    /// Background expiry sweep interval in seconds, 0 = disabled
    pub cleanup_interval: u64,
    /// Simulated latency of a store read in milliseconds
    pub store_read_delay_ms: u64,
    /// Simulated latency of a store write in milliseconds
    pub store_write_delay_ms: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_SECS` - Entry TTL in seconds (default: 5)
    /// - `CLOSE_GRACE_MS` - Shutdown grace period in milliseconds (default: 0)
    /// - `QUEUE_CAPACITY` - Bounded queue capacity, 0 = unbounded (default: 0)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds, 0 = off (default: 1)
    /// - `STORE_READ_DELAY_MS` - Simulated store read latency (default: 50)
    /// - `STORE_WRITE_DELAY_MS` - Simulated store write latency (default: 100)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl_secs: env_or("CACHE_TTL_SECS", defaults.ttl_secs),
            close_grace_ms: env_or("CLOSE_GRACE_MS", defaults.close_grace_ms),
            queue_capacity: env_or("QUEUE_CAPACITY", defaults.queue_capacity),
            cleanup_interval: env_or("CLEANUP_INTERVAL", defaults.cleanup_interval),
            store_read_delay_ms: env_or("STORE_READ_DELAY_MS", defaults.store_read_delay_ms),
            store_write_delay_ms: env_or("STORE_WRITE_DELAY_MS", defaults.store_write_delay_ms),
            server_port: env_or("SERVER_PORT", defaults.server_port),
        }
    }

    /// Grace period applied by `close` during shutdown.
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }

    /// Builds the cache options described by this configuration.
    pub fn cache_options(&self) -> CacheOptions {
        let queue_mode = match self.queue_capacity {
            0 => QueueMode::Unbounded,
            capacity => QueueMode::Bounded(capacity),
        };
        let cleanup_interval = match self.cleanup_interval {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        CacheOptions {
            ttl: Duration::from_secs(self.ttl_secs),
            queue_mode,
            cleanup_interval,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ttl_secs: 5,
            close_grace_ms: 0,
            queue_capacity: 0,
            cleanup_interval: 1,
            store_read_delay_ms: 50,
            store_write_delay_ms: 100,
            server_port: 3000,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
