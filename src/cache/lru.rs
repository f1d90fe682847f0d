//! Recency Order Module
//!
//! Keeps the keys of one namespace ordered by last access for LRU eviction.

use std::collections::VecDeque;

// == Recency Order ==
/// Access order of the keys in one namespace.
///
/// Front = least recently used, back = most recently used. The store stamps
/// `last_accessed` from a per-namespace value that never decreases, so the
/// front key always carries the smallest `last_accessed`.
#[derive(Debug, Default)]
pub struct RecencyOrder {
    keys: VecDeque<String>,
}

impl RecencyOrder {
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Moves `key` to the most recently used position, inserting it if new.
    pub fn touch(&mut self, key: &str) {
        if let Some(pos) = self.keys.iter().position(|k| k == key) {
            if let Some(existing) = self.keys.remove(pos) {
                self.keys.push_back(existing);
                return;
            }
        }
        self.keys.push_back(key.to_string());
    }

    // == Remove ==
    /// Forgets `key`. Returns whether it was tracked.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.keys.iter().position(|k| k == key) {
            Some(pos) => self.keys.remove(pos).is_some(),
            None => false,
        }
    }

    // == Pop Least Recent ==
    /// Removes and returns the least recently used key.
    pub fn pop_least_recent(&mut self) -> Option<String> {
        self.keys.pop_front()
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_least_recent(&self) -> Option<&str> {
        self.keys.front().map(String::as_str)
    }
}
