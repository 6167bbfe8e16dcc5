//! A bounded, thread-safe cache of lazily materialized chunks.
//!
//! The first request for a key becomes the *leader* of a flight and runs the loader with no cache lock held. Concurrent
//! requests for the same key wait on the flight and receive the leader's result, so a chunk is synthesized at most once per
//! miss. Requests for other keys are never blocked by a running loader.
//!
//! ```
//! use pyramid_mosaic_storage::{CacheCapacity, LazyChunkCache};
//! use std::sync::Arc;
//!
//! let cache: LazyChunkCache<u32, Vec<u8>, String> = LazyChunkCache::new(CacheCapacity::with_max_chunks(2));
//!
//! let a = cache.get_or_load(1, |_| Ok(vec![1; 8])).unwrap();
//! let b = cache.get_or_load(1, |_| panic!("already resident")).unwrap();
//! assert!(Arc::ptr_eq(&a, &b));
//! ```

use super::lru_cache::SmallKeyLruCache;
use crate::SmallKeyHashMap;

use core::hash::Hash;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::sync::Arc;

/// Limits on what a `LazyChunkCache` keeps resident. Least recently used chunks are evicted while either limit is exceeded.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CacheCapacity {
    pub max_chunks: usize,
    /// `None` means no byte limit.
    pub max_bytes: Option<usize>,
}

impl CacheCapacity {
    pub const fn with_max_chunks(max_chunks: usize) -> Self {
        Self {
            max_chunks,
            max_bytes: None,
        }
    }

    fn is_exceeded(&self, num_chunks: usize, num_bytes: usize) -> bool {
        num_chunks > self.max_chunks || self.max_bytes.map_or(false, |max| num_bytes > max)
    }
}

impl Default for CacheCapacity {
    fn default() -> Self {
        Self::with_max_chunks(1024)
    }
}

/// The number of bytes a cached value occupies. Used to enforce `CacheCapacity::max_bytes`.
pub trait ChunkWeight {
    fn weight_bytes(&self) -> usize;
}

impl<T> ChunkWeight for Vec<T> {
    fn weight_bytes(&self) -> usize {
        self.len() * std::mem::size_of::<T>()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CacheStats {
    /// Requests served from a resident chunk.
    pub hits: u64,
    /// Requests that found no resident chunk, including those that joined another request's flight.
    pub misses: u64,
    /// Loader invocations.
    pub loads: u64,
    pub evictions: u64,
}

pub struct LazyChunkCache<K, V, E> {
    capacity: CacheCapacity,
    state: Mutex<CacheState<K, V, E>>,
}

struct CacheState<K, V, E> {
    resident: SmallKeyLruCache<K, Resident<V>>,
    in_flight: SmallKeyHashMap<K, Arc<Flight<V, E>>>,
    resident_bytes: usize,
    stats: CacheStats,
}

struct Resident<V> {
    value: Arc<V>,
    bytes: usize,
}

struct Flight<V, E> {
    outcome: Mutex<Outcome<V, E>>,
    finished: Condvar,
}

enum Outcome<V, E> {
    Pending,
    Loaded(Arc<V>),
    Failed(E),
    /// The leader went away without an outcome, e.g. its loader panicked.
    Abandoned,
}

impl<V, E> Flight<V, E>
where
    E: Clone,
{
    fn new() -> Self {
        Self {
            outcome: Mutex::new(Outcome::Pending),
            finished: Condvar::new(),
        }
    }

    fn finish(&self, outcome: Outcome<V, E>) {
        *self.outcome.lock() = outcome;
        self.finished.notify_all();
    }

    /// Blocks until the leader finishes. `None` means the flight was abandoned.
    fn wait(&self) -> Option<Result<Arc<V>, E>> {
        let mut outcome = self.outcome.lock();
        while let Outcome::Pending = *outcome {
            self.finished.wait(&mut outcome);
        }

        match &*outcome {
            Outcome::Loaded(value) => Some(Ok(value.clone())),
            Outcome::Failed(e) => Some(Err(e.clone())),
            Outcome::Abandoned | Outcome::Pending => None,
        }
    }
}

enum Role<V, E> {
    Leader(Arc<Flight<V, E>>),
    Waiter(Arc<Flight<V, E>>),
}

impl<K, V, E> LazyChunkCache<K, V, E>
where
    K: Clone + Debug + Eq + Hash,
    V: ChunkWeight,
    E: Clone,
{
    pub fn new(capacity: CacheCapacity) -> Self {
        Self {
            capacity,
            state: Mutex::new(CacheState {
                resident: Default::default(),
                in_flight: Default::default(),
                resident_bytes: 0,
                stats: Default::default(),
            }),
        }
    }

    pub fn capacity(&self) -> CacheCapacity {
        self.capacity
    }

    /// Returns the chunk for `key`, calling `loader` if it is not resident.
    ///
    /// Concurrent calls for the same missing key share a single call of `loader`. A loader error is returned to every caller
    /// of that flight but is not cached; the next request tries again.
    pub fn get_or_load(&self, key: K, loader: impl FnOnce(&K) -> Result<V, E>) -> Result<Arc<V>, E> {
        self.get_or_load_if(key, loader, |_| true)
    }

    /// Like `get_or_load`, but a freshly loaded chunk is only kept if `admit` accepts its key when the load finishes.
    /// `admit` runs under the cache lock, so it is ordered with respect to `retain`. Rejected chunks are still returned to
    /// every caller of the flight.
    pub fn get_or_load_if(
        &self,
        key: K,
        loader: impl FnOnce(&K) -> Result<V, E>,
        admit: impl FnOnce(&K) -> bool,
    ) -> Result<Arc<V>, E> {
        loop {
            let role = {
                let mut state = self.state.lock();
                if let Some(resident) = state.resident.get_and_touch(&key) {
                    let value = resident.value.clone();
                    state.stats.hits += 1;
                    tracing::trace!(?key, "chunk cache hit");

                    return Ok(value);
                }
                state.stats.misses += 1;

                let CacheState { in_flight, .. } = &mut *state;
                match in_flight.get(&key) {
                    Some(flight) => Role::Waiter(flight.clone()),
                    None => {
                        let flight = Arc::new(Flight::new());
                        in_flight.insert(key.clone(), flight.clone());

                        Role::Leader(flight)
                    }
                }
            };

            match role {
                Role::Leader(flight) => return self.lead(key, flight, loader, admit),
                Role::Waiter(flight) => {
                    if let Some(result) = flight.wait() {
                        return result;
                    }
                    // The leader was abandoned, so try to become the new leader.
                }
            }
        }
    }

    fn lead(
        &self,
        key: K,
        flight: Arc<Flight<V, E>>,
        loader: impl FnOnce(&K) -> Result<V, E>,
        admit: impl FnOnce(&K) -> bool,
    ) -> Result<Arc<V>, E> {
        let mut guard = FlightGuard {
            cache: self,
            key: Some(key.clone()),
            flight,
        };

        let result = loader(&key).map(Arc::new);

        let mut state = self.state.lock();
        state.in_flight.remove(&key);
        state.stats.loads += 1;
        let outcome = match &result {
            Ok(value) => {
                if admit(&key) {
                    self.admit(&mut state, key, value.clone());
                } else {
                    tracing::trace!(?key, "loaded chunk not admitted");
                }

                Outcome::Loaded(value.clone())
            }
            Err(e) => Outcome::Failed(e.clone()),
        };
        drop(state);

        guard.flight.finish(outcome);
        guard.key = None;

        result
    }

    fn admit(&self, state: &mut CacheState<K, V, E>, key: K, value: Arc<V>) {
        let bytes = value.weight_bytes();
        if let Some(old) = state.resident.insert(key, Resident { value, bytes }) {
            state.resident_bytes -= old.bytes;
        }
        state.resident_bytes += bytes;

        while self
            .capacity
            .is_exceeded(state.resident.len(), state.resident_bytes)
        {
            match state.resident.remove_lru() {
                Some((evicted_key, evicted)) => {
                    // Readers holding the `Arc` keep the chunk alive.
                    state.resident_bytes -= evicted.bytes;
                    state.stats.evictions += 1;
                    tracing::trace!(key = ?evicted_key, "evicted chunk");
                }
                None => break,
            }
        }
    }

    /// The chunk for `key` if it is resident. Does not affect the LRU order.
    pub fn get_resident(&self, key: &K) -> Option<Arc<V>> {
        self.state.lock().resident.get(key).map(|r| r.value.clone())
    }

    pub fn contains(&self, key: &K) -> bool {
        self.state.lock().resident.contains_key(key)
    }

    /// Drops every resident chunk whose key is rejected by `keep`. Returns the number of chunks dropped.
    pub fn retain(&self, mut keep: impl FnMut(&K) -> bool) -> usize {
        let mut state = self.state.lock();
        let removed = state.resident.retain(|k, _| keep(k));
        for (_, r) in removed.iter() {
            state.resident_bytes -= r.bytes;
        }

        removed.len()
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.resident.clear();
        state.resident_bytes = 0;
    }

    /// The number of resident chunks.
    pub fn len(&self) -> usize {
        self.state.lock().resident.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn resident_bytes(&self) -> usize {
        self.state.lock().resident_bytes
    }

    pub fn stats(&self) -> CacheStats {
        self.state.lock().stats
    }
}

/// Cleans up a flight whose leader returns without recording an outcome, so waiters can retry instead of blocking forever.
struct FlightGuard<'a, K, V, E>
where
    K: Clone + Debug + Eq + Hash,
    V: ChunkWeight,
    E: Clone,
{
    cache: &'a LazyChunkCache<K, V, E>,
    key: Option<K>,
    flight: Arc<Flight<V, E>>,
}

impl<'a, K, V, E> Drop for FlightGuard<'a, K, V, E>
where
    K: Clone + Debug + Eq + Hash,
    V: ChunkWeight,
    E: Clone,
{
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.cache.state.lock().in_flight.remove(&key);
            self.flight.finish(Outcome::Abandoned);
        }
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
