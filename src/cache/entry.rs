//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::Duration;

// == Cache Entry ==
/// Represents a single cache entry with its serialized payload and metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The serialized payload
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
    /// Last read hit or write (Unix milliseconds)
    pub last_accessed: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new cache entry stamped at `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The serialized payload to store
    /// * `ttl` - Lifetime of the entry
    /// * `now_ms` - Current time in Unix milliseconds
    pub fn new(value: String, ttl: Duration, now_ms: u64) -> Self {
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);

        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_ms),
            last_accessed: now_ms,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now_ms`.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// the expiration time, so a read at exactly insert time + ttl misses.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Touch ==
    /// Records a read hit at `now_ms`.
    pub fn touch(&mut self, now_ms: u64) {
        self.last_accessed = self.last_accessed.max(now_ms);
    }
}
