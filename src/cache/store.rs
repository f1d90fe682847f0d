//! Cache Store Module
//!
//! Namespaced cache engine combining HashMap storage with LRU tracking and
//! TTL expiration. Each namespace has its own lock, capacity and counters.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Clock, RecencyOrder, SystemClock};

// == Namespace ==
/// Entries, recency order and counters of one namespace.
///
/// Always accessed under its own mutex, so capacity checks, eviction and
/// insertion happen in one critical section.
#[derive(Debug)]
struct Namespace {
    entries: HashMap<String, CacheEntry>,
    order: RecencyOrder,
    stats: CacheStats,
    limit: usize,
    /// Latest `last_accessed` handed out, never decreases
    latest_access: u64,
}

impl Namespace {
    fn new(limit: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: RecencyOrder::new(),
            stats: CacheStats::new(limit),
            limit,
            latest_access: 0,
        }
    }

    /// Access stamp for `now_ms`, held at or above every earlier stamp so
    /// `last_accessed` follows recency order even if the clock steps back.
    fn access_stamp(&mut self, now_ms: u64) -> u64 {
        self.latest_access = self.latest_access.max(now_ms);
        self.latest_access
    }

    fn remove(&mut self, key: &str) -> bool {
        self.order.remove(key);
        self.entries.remove(key).is_some()
    }

    /// Drops every entry whose TTL has elapsed.
    fn purge_expired(&mut self, now_ms: u64) -> usize {
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now_ms))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            self.remove(key);
        }

        self.stats.record_expirations(expired.len());
        expired.len()
    }

    /// Evicts least recently used entries until at most `max_len` remain.
    fn shrink_to(&mut self, max_len: usize) {
        while self.entries.len() > max_len {
            match self.order.pop_least_recent() {
                Some(key) => {
                    self.entries.remove(&key);
                    self.stats.record_eviction();
                    debug!("Evicted least recently used key '{}'", key);
                }
                None => break,
            }
        }
    }

    /// Counters with expired entries purged first, so `total_entries` is live.
    fn snapshot(&mut self, now_ms: u64) -> CacheStats {
        self.purge_expired(now_ms);
        CacheStats {
            total_entries: self.entries.len(),
            limit: self.limit,
            ..self.stats.clone()
        }
    }
}

// == Cache Store ==
/// Thread-safe keyed store with per-namespace TTL expiry, capacity limit
/// and LRU eviction.
///
/// Constructed explicitly and shared behind an `Arc`; there is no global
/// instance.
#[derive(Debug)]
pub struct CacheStore {
    namespaces: RwLock<HashMap<String, Arc<Mutex<Namespace>>>>,
    default_limit: usize,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    // == Constructor ==
    /// Creates a store reading time from the system clock.
    ///
    /// # Arguments
    /// * `default_limit` - Capacity of namespaces that were never configured
    pub fn new(default_limit: usize) -> Self {
        Self::with_clock(default_limit, Arc::new(SystemClock))
    }

    /// Creates a store reading time from `clock`.
    pub fn with_clock(default_limit: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            default_limit,
            clock,
        }
    }

    fn namespace(&self, namespace: &str) -> Arc<Mutex<Namespace>> {
        if let Some(ns) = self.namespaces.read().get(namespace) {
            return Arc::clone(ns);
        }

        let mut namespaces = self.namespaces.write();
        Arc::clone(
            namespaces
                .entry(namespace.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(Namespace::new(self.default_limit)))),
        )
    }

    // == Set Limit ==
    /// Sets the capacity of `namespace`.
    ///
    /// Lowering the limit evicts least recently used entries right away. A
    /// limit of zero disables storage for the namespace.
    pub fn set_limit(&self, namespace: &str, limit: usize) {
        let ns = self.namespace(namespace);
        let mut ns = ns.lock();
        ns.limit = limit;
        ns.shrink_to(limit);
    }

    // == Put ==
    /// Stores `value` under `key` in `namespace` for `ttl`.
    ///
    /// Overwriting an existing key resets its TTL and recency. Inserting a
    /// new key into a full namespace first drops expired entries, then
    /// evicts by ascending `last_accessed` until one slot is free.
    pub fn put(&self, namespace: &str, key: &str, value: String, ttl: Duration) {
        let now = self.clock.now_ms();
        let ns = self.namespace(namespace);
        let mut ns = ns.lock();

        if ns.limit == 0 {
            debug!("Namespace '{}' has zero capacity, not storing '{}'", namespace, key);
            return;
        }

        if !ns.entries.contains_key(key) && ns.entries.len() >= ns.limit {
            ns.purge_expired(now);
            let limit = ns.limit;
            ns.shrink_to(limit - 1);
        }

        let mut entry = CacheEntry::new(value, ttl, now);
        entry.touch(ns.access_stamp(now));
        ns.entries.insert(key.to_string(), entry);
        ns.order.touch(key);
    }

    // == Get ==
    /// Returns the live value for `key`, refreshing its recency.
    ///
    /// An expired entry reads as absent and is removed on the spot.
    pub fn get(&self, namespace: &str, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        let ns = self.namespace(namespace);
        let mut guard = ns.lock();
        let ns = &mut *guard;
        let stamp = ns.access_stamp(now);

        let expired = match ns.entries.get_mut(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                entry.touch(stamp);
                let value = entry.value.clone();
                ns.order.touch(key);
                ns.stats.record_hit();
                return Some(value);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            ns.remove(key);
            ns.stats.record_expirations(1);
        }
        ns.stats.record_miss();
        None
    }

    // == Contains ==
    /// Returns whether a live entry exists for `key`.
    ///
    /// Does not refresh recency or count as a read.
    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        let now = self.clock.now_ms();
        let ns = self.namespace(namespace);
        let mut ns = ns.lock();

        match ns.entries.get(key).map(|entry| entry.is_expired_at(now)) {
            Some(false) => true,
            Some(true) => {
                ns.remove(key);
                ns.stats.record_expirations(1);
                false
            }
            None => false,
        }
    }

    // == Evict Expired ==
    /// Removes expired entries from every namespace.
    ///
    /// Returns the number of entries removed.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let namespaces: Vec<Arc<Mutex<Namespace>>> =
            self.namespaces.read().values().cloned().collect();

        namespaces
            .iter()
            .map(|ns| ns.lock().purge_expired(now))
            .sum()
    }

    // == Count ==
    /// Returns the number of live entries in `namespace`.
    pub fn count(&self, namespace: &str) -> usize {
        let now = self.clock.now_ms();
        let ns = self.namespace(namespace);
        let mut ns = ns.lock();
        ns.purge_expired(now);
        ns.entries.len()
    }

    // == Stats ==
    /// Returns the counters of `namespace`, if it has been used.
    pub fn stats(&self, namespace: &str) -> Option<CacheStats> {
        let now = self.clock.now_ms();
        let ns = self.namespaces.read().get(namespace).cloned()?;
        let stats = ns.lock().snapshot(now);
        Some(stats)
    }

    /// Returns the counters of every namespace, sorted by name.
    pub fn all_stats(&self) -> Vec<(String, CacheStats)> {
        let now = self.clock.now_ms();
        let namespaces: Vec<(String, Arc<Mutex<Namespace>>)> = self
            .namespaces
            .read()
            .iter()
            .map(|(name, ns)| (name.clone(), Arc::clone(ns)))
            .collect();

        let mut stats: Vec<(String, CacheStats)> = namespaces
            .into_iter()
            .map(|(name, ns)| (name, ns.lock().snapshot(now)))
            .collect();
        stats.sort_by(|a, b| a.0.cmp(&b.0));
        stats
    }

    /// Returns the least recently used live key of `namespace`.
    pub fn peek_least_recent(&self, namespace: &str) -> Option<String> {
        let ns = self.namespaces.read().get(namespace).cloned()?;
        let ns = ns.lock();
        ns.order.peek_least_recent().map(str::to_string)
    }
}
