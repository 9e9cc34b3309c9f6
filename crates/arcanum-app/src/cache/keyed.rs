//! Keyed cache with request coalescing.
//!
//! A `KeyedCache` pairs an entry map with an in-flight registry. The
//! registry guarantees at most one outstanding computation per key: callers
//! that ask for a key while a computation is pending attach to it instead of
//! issuing a duplicate request, and the pending entry is removed
//! unconditionally when the computation settles, success or failure.
//!
//! Cache writes happen in settlement order of their own request, not
//! issuance order: for the same key, the last-settled response wins. That is
//! a deliberate consistency tradeoff and is pinned by tests.

use arcanum_core::error::{ArcanumError, Result};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};
use tokio::sync::broadcast;

/// How a cached value interacts with revalidation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Serve a cached value but still revalidate (article list, article
    /// detail, comments).
    ReadThrough,
    /// A cached value short-circuits the fetch entirely (categories, tags,
    /// site info).
    CacheFirst,
}

/// Registry of pending computations, at most one per key.
pub struct InFlightRegistry<K, V> {
    pending: Mutex<HashMap<K, (u64, broadcast::Sender<Result<V>>)>>,
    next_id: AtomicU64,
}

enum Flight<V> {
    /// This caller owns the computation and must settle it.
    Started(u64, broadcast::Sender<Result<V>>),
    /// Another caller owns the computation; await its settlement.
    Attached(broadcast::Receiver<Result<V>>),
}

impl<K, V> InFlightRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Number of keys with a pending computation.
    pub fn len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Joins or starts the computation for `key`.
    ///
    /// A forced request starts a new computation even when one is pending,
    /// replacing the registry entry; attachers of the old computation still
    /// receive its settlement.
    fn begin(&self, key: &K, force: bool) -> Flight<V> {
        let mut pending = self.pending.lock().unwrap();

        if !force {
            if let Some((_, sender)) = pending.get(key) {
                return Flight::Attached(sender.subscribe());
            }
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, _rx) = broadcast::channel(1);
        pending.insert(key.clone(), (id, tx.clone()));
        Flight::Started(id, tx)
    }

    /// Removes the registration (if it is still ours) and broadcasts the
    /// settlement to attachers.
    ///
    /// Subscription and settlement both happen under the registry lock, so
    /// an attacher either subscribed before the broadcast or finds the
    /// registry without the entry and starts a fresh computation.
    fn settle(&self, key: &K, id: u64, sender: &broadcast::Sender<Result<V>>, result: Result<V>) {
        let pending = &mut *self.pending.lock().unwrap();

        if matches!(pending.get(key), Some((current, _)) if *current == id) {
            pending.remove(key);
        }

        let _ = sender.send(result);
    }
}

impl<K, V> Default for InFlightRegistry<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// An entry map plus its in-flight registry.
///
/// Entries are immutable once stored: a refresh replaces the value
/// wholesale. A failed refresh never evicts a previously good entry.
pub struct KeyedCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
    inflight: InFlightRegistry<K, V>,
}

impl<K, V> KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            inflight: InFlightRegistry::new(),
        }
    }

    /// Returns the cached value without touching the network.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.entries.read().unwrap().get(key).cloned()
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries.read().unwrap().contains_key(key)
    }

    /// Stores a value directly (used by tests and warm-up paths).
    pub fn insert(&self, key: K, value: V) {
        self.entries.write().unwrap().insert(key, value);
    }

    /// Drops every cached entry.
    pub fn clear(&self) {
        self.entries.write().unwrap().clear();
    }

    /// The get-or-fetch contract.
    ///
    /// - `CacheFirst` + cache hit + `!force`: returns the entry, no request.
    /// - pending computation for `key` + `!force`: attaches, no new request.
    /// - otherwise: registers the computation, runs `loader`, stores the
    ///   result on success, and broadcasts the settlement. On failure any
    ///   existing entry is preserved.
    ///
    /// Exactly one request is issued per distinct key per force-refresh
    /// cycle regardless of the number of concurrent callers.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: K,
        force: bool,
        mode: FetchMode,
        loader: F,
    ) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if !force && mode == FetchMode::CacheFirst {
            if let Some(cached) = self.peek(&key) {
                return Ok(cached);
            }
        }

        match self.inflight.begin(&key, force) {
            Flight::Attached(mut rx) => rx
                .recv()
                .await
                .unwrap_or_else(|_| Err(ArcanumError::Aborted)),
            Flight::Started(id, tx) => {
                let result = loader().await;

                if let Ok(value) = &result {
                    self.entries.write().unwrap().insert(key.clone(), value.clone());
                }

                self.inflight.settle(&key, id, &tx, result.clone());
                result
            }
        }
    }
}

impl<K, V> Default for KeyedCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
