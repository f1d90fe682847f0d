//! Cache Module
//!
//! Provides namespaced in-memory caching with TTL expiration and LRU eviction.

mod clock;
mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::CacheEntry;
pub use lru::RecencyOrder;
pub use stats::CacheStats;
pub use store::CacheStore;
