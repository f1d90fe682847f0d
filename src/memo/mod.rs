//! Memoization Module
//!
//! Caches the results of async fetch functions in a [`CacheStore`](crate::cache::CacheStore)
//! namespace, with one in-flight fetch per key.

mod key;
mod memoizer;

pub use key::derive_key;
pub use memoizer::{memoize, FetchFuture, Memoizer, DEFAULT_FETCH_TIMEOUT};
