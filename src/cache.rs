//! Coalescing memo cache for resolved lookups.
//!
//! Finished values live in an LRU map. A lookup that is still running lives
//! in a separate pending map as a [`OnceCell`]: the first caller for a key
//! runs the initialiser, callers arriving while it runs wait on the same
//! cell. Pending cells are never evicted, so a key has at most one running
//! initialiser whatever the eviction policy. A failed initialisation is
//! dropped from the pending map once nobody waits on it, so the next caller
//! runs the initialiser again.

use crate::error::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

/// When cached values are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Eviction {
    /// Keep everything until invalidated.
    #[default]
    Never,
    /// Keep at most this many keys, dropping the least recently used.
    Lru(usize),
}

struct CacheState<K, V> {
    values: LruCache<K, V>,
    pending: HashMap<K, Arc<OnceCell<V>>>,
}

/// Memo cache keyed by `K`, shared by cloning.
pub struct ResolveCache<K, V> {
    state: Arc<Mutex<CacheState<K, V>>>,
    eviction: Eviction,
    hit_count: Arc<AtomicU64>,
    miss_count: Arc<AtomicU64>,
}

impl<K, V> Clone for ResolveCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            eviction: self.eviction,
            hit_count: Arc::clone(&self.hit_count),
            miss_count: Arc::clone(&self.miss_count),
        }
    }
}

impl<K: Hash + Eq, V> std::fmt::Debug for ResolveCache<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ResolveCache")
            .field("eviction", &self.eviction)
            .field("size", &state.values.len())
            .field("in_flight", &state.pending.len())
            .finish()
    }
}

impl<K: Hash + Eq + Clone, V: Clone> Default for ResolveCache<K, V> {
    fn default() -> Self {
        Self::new(Eviction::default())
    }
}

impl<K: Hash + Eq + Clone, V: Clone> ResolveCache<K, V> {
    pub fn new(eviction: Eviction) -> Self {
        let values = match eviction {
            Eviction::Never => LruCache::unbounded(),
            Eviction::Lru(capacity) => {
                LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN))
            }
        };
        Self {
            state: Arc::new(Mutex::new(CacheState {
                values,
                pending: HashMap::new(),
            })),
            eviction,
            hit_count: Arc::new(AtomicU64::new(0)),
            miss_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn eviction(&self) -> Eviction {
        self.eviction
    }

    /// Cached value for `key`, running `init` if there is none yet.
    ///
    /// At most one `init` runs per key at a time. Errors are returned to
    /// the caller whose `init` failed and are not cached.
    pub async fn get_or_try_init<F, Fut>(&self, key: K, init: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut state = self.state.lock();
            if let Some(value) = state.values.get(&key) {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                trace!("Cache hit");
                return Ok(value.clone());
            }
            Arc::clone(
                state
                    .pending
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss");
        let result = cell.get_or_try_init(init).await.cloned();

        let mut state = self.state.lock();
        let ours = state
            .pending
            .get(&key)
            .is_some_and(|pending| Arc::ptr_eq(pending, &cell));
        match &result {
            Ok(value) => {
                if ours {
                    state.pending.remove(&key);
                    state.values.put(key, value.clone());
                }
            }
            // map + this caller: nobody else is waiting to retry on it
            Err(_) => {
                if ours && !cell.initialized() && Arc::strong_count(&cell) == 2 {
                    state.pending.remove(&key);
                }
            }
        }
        result
    }

    /// Cached value for `key` without initialising.
    pub fn get(&self, key: &K) -> Option<V> {
        self.state.lock().values.get(key).cloned()
    }

    /// Drop the value for `key`. Callers already waiting keep their cell,
    /// but its result is no longer stored.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.lock();
        state.values.pop(key);
        state.pending.remove(key);
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.values.clear();
        state.pending.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hit_count.load(Ordering::Relaxed);
        let misses = self.miss_count.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };

        let state = self.state.lock();
        CacheStats {
            hits,
            misses,
            hit_rate,
            size: state.values.len(),
            in_flight: state.pending.len(),
            capacity: match self.eviction {
                Eviction::Never => None,
                Eviction::Lru(_) => Some(state.values.cap().get()),
            },
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    /// Finished values held
    pub size: usize,
    /// Lookups still running
    pub in_flight: usize,
    /// `None` when unbounded
    pub capacity: Option<usize>,
}
