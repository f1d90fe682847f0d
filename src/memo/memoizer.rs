//! Memoizer Module
//!
//! Wraps an async fetch function with a namespaced cache and single-flight
//! population: at most one fetch per key runs at a time, and concurrent
//! callers for that key share its outcome.

use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::cache::CacheStore;
use crate::error::FetchError;
use crate::memo::derive_key;

/// Default bound on a fetch and on waiting for someone else's fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Boxed future returned by a wrapped fetch function.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;

type FetchFn<A, T> = Box<dyn Fn(A) -> FetchFuture<T> + Send + Sync>;

/// Serialized value or failure, as delivered to waiters.
type Outcome = Result<String, FetchError>;

/// Keys with a fetch in progress, and the channel their outcome arrives on.
type InFlight = HashMap<String, watch::Receiver<Option<Outcome>>>;

enum Role {
    Leader(watch::Sender<Option<Outcome>>),
    Waiter(watch::Receiver<Option<Outcome>>),
}

/// Removes a leader's registry slot if the leader is dropped mid-fetch.
struct InFlightGuard<'a> {
    in_flight: &'a Mutex<InFlight>,
    key: &'a str,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.in_flight.lock().remove(self.key);
        }
    }
}

// == Memoizer ==
/// A fetch function wrapped with caching.
///
/// Results are stored serialized in the [`CacheStore`] under
/// `(namespace, namespace + json(args))`. Failures are never cached.
pub struct Memoizer<A, T> {
    namespace: String,
    ttl: Duration,
    timeout: Duration,
    store: Arc<CacheStore>,
    fetch: FetchFn<A, T>,
    in_flight: Mutex<InFlight>,
    _marker: PhantomData<fn(A) -> T>,
}

/// Wraps `fetch` so its results are cached in `namespace` of `store`.
///
/// The namespace capacity is set to `limit`; entries live for `ttl`.
pub fn memoize<A, T, F, Fut>(
    store: Arc<CacheStore>,
    namespace: impl Into<String>,
    ttl: Duration,
    limit: usize,
    fetch: F,
) -> Memoizer<A, T>
where
    A: Serialize + Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Fn(A) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, FetchError>> + Send + 'static,
{
    let namespace = namespace.into();
    store.set_limit(&namespace, limit);

    Memoizer {
        namespace,
        ttl,
        timeout: DEFAULT_FETCH_TIMEOUT,
        store,
        fetch: Box::new(move |args| -> FetchFuture<T> { Box::pin(fetch(args)) }),
        in_flight: Mutex::new(HashMap::new()),
        _marker: PhantomData,
    }
}

impl<A, T> Memoizer<A, T>
where
    A: Serialize + Send + 'static,
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Sets the bound on a fetch and on waiting for an in-flight one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    // == Key Exists ==
    /// Returns whether a live cached result exists for `args`.
    ///
    /// Never fetches, never populates and does not refresh recency.
    pub fn key_exists(&self, args: &A) -> bool {
        match derive_key(&self.namespace, args) {
            Ok(key) => self.store.contains(&self.namespace, &key),
            Err(_) => false,
        }
    }

    // == Call ==
    /// Returns the cached result for `args`, fetching it on a miss.
    ///
    /// If another caller is already fetching the same key, waits for that
    /// fetch instead of starting a second one.
    pub async fn call(&self, args: A) -> Result<T, FetchError> {
        let key = derive_key(&self.namespace, &args)?;

        // The cache check and the registry update are one step, so a caller
        // can't miss the cache just after a leader filled it and fetch again.
        let role = {
            let mut in_flight = self.in_flight.lock();

            if let Some(cached) = self.store.get(&self.namespace, &key) {
                debug!("Cache hit for '{}'", key);
                return Ok(serde_json::from_str(&cached)?);
            }

            match in_flight.get(&key) {
                Some(rx) => Role::Waiter(rx.clone()),
                None => {
                    let (tx, rx) = watch::channel(None);
                    in_flight.insert(key.clone(), rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => self.lead(&key, args, tx).await,
            Role::Waiter(rx) => self.join(&key, rx).await,
        }
    }

    async fn lead(
        &self,
        key: &str,
        args: A,
        tx: watch::Sender<Option<Outcome>>,
    ) -> Result<T, FetchError> {
        let mut guard = InFlightGuard {
            in_flight: &self.in_flight,
            key,
            armed: true,
        };

        debug!("Cache miss for '{}', fetching", key);
        let result = match tokio::time::timeout(self.timeout, (self.fetch)(args)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        let outcome: Outcome = match &result {
            Ok(value) => serde_json::to_string(value).map_err(FetchError::from),
            Err(err) => Err(err.clone()),
        };

        {
            let mut in_flight = self.in_flight.lock();
            if let Ok(serialized) = &outcome {
                self.store
                    .put(&self.namespace, key, serialized.clone(), self.ttl);
            }
            in_flight.remove(key);
            guard.armed = false;
        }

        if let Err(err) = &outcome {
            warn!("Fetch for '{}' failed: {}", key, err);
        }

        // Nobody waiting is fine
        let _ = tx.send(Some(outcome.clone()));

        match (result, outcome) {
            (Ok(value), Ok(_)) => Ok(value),
            (Ok(_), Err(err)) | (Err(err), _) => Err(err),
        }
    }

    async fn join(
        &self,
        key: &str,
        mut rx: watch::Receiver<Option<Outcome>>,
    ) -> Result<T, FetchError> {
        debug!("Joining in-flight fetch for '{}'", key);

        let outcome = match tokio::time::timeout(self.timeout, rx.wait_for(Option::is_some)).await
        {
            Ok(Ok(delivered)) => delivered
                .clone()
                .unwrap_or_else(|| Err(FetchError::Abandoned(key.to_string()))),
            Ok(Err(_)) => Err(FetchError::Abandoned(key.to_string())),
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        };

        let serialized = outcome?;
        Ok(serde_json::from_str(&serialized)?)
    }
}
