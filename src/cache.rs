//! Bounded TTL cache for upstream responses and translated text
//!
//! Provides a thread-safe key-value store with a fixed capacity and a
//! uniform time-to-live. When a new key would exceed the capacity, the
//! oldest-inserted entry is evicted. Expiry is lazy: entries past their
//! TTL are removed when a read touches them (or by [`SimpleCache::cleanup_expired`],
//! which the server runs on an interval).

use std::collections::HashMap;
use std::future::Future;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Thread-safe bounded cache with TTL expiry and remove-oldest eviction
#[derive(Debug)]
pub struct SimpleCache<V> {
    /// Maximum number of entries
    capacity: usize,
    /// Time-to-live applied uniformly to all entries
    ttl: Duration,
    /// Value and insertion-time mappings, kept in lockstep under one lock
    inner: Mutex<Inner<V>>,
}

/// The two mappings guarded by the instance lock.
///
/// Invariant: `entries` and `timestamps` always hold the same key set,
/// and `entries.len() <= capacity`.
#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, V>,
    timestamps: HashMap<String, Instant>,
}

/// Aggregate statistics for one cache instance
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Current entry count, including expired-but-unswept entries
    pub total_items: usize,
    /// Capacity bound
    pub maxsize: usize,
    /// TTL in seconds
    pub ttl_seconds: u64,
}

impl<V: Clone> SimpleCache<V> {
    /// Create a cache bounded to `capacity` entries, each living for `ttl`.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        assert!(capacity > 0, "cache capacity must be positive");
        Self {
            capacity,
            ttl,
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                timestamps: HashMap::new(),
            }),
        }
    }

    /// Get a value if it exists and hasn't expired.
    ///
    /// An expired entry is removed as a side effect of the read. A
    /// successful read does not refresh the TTL; only [`SimpleCache::set`] does.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut inner = self.inner.lock();

        let stamp = *inner.timestamps.get(key)?;
        if stamp.elapsed() >= self.ttl {
            inner.entries.remove(key);
            inner.timestamps.remove(key);
            return None;
        }

        inner.entries.get(key).cloned()
    }

    /// Store a value, evicting the oldest entry first when a new key
    /// would exceed the capacity.
    ///
    /// Re-setting an existing key overwrites its value and resets its
    /// insertion time (refreshing both the TTL and the eviction order)
    /// without changing the entry count.
    pub fn set(&self, key: &str, value: V) {
        let mut inner = self.inner.lock();

        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(key) {
            Self::remove_oldest(&mut inner);
        }

        inner.entries.insert(key.to_string(), value);
        inner.timestamps.insert(key.to_string(), Instant::now());
    }

    /// Remove a key. Removing an absent key is a no-op, not an error.
    pub fn delete(&self, key: &str) {
        let mut inner = self.inner.lock();
        inner.entries.remove(key);
        inner.timestamps.remove(key);
    }

    /// Evict the entry with the oldest insertion time.
    ///
    /// Entries sharing the same stamp tie-break on the smaller key, so
    /// eviction is deterministic.
    fn remove_oldest(inner: &mut Inner<V>) {
        let oldest = inner
            .timestamps
            .iter()
            .min_by(|(ka, ta), (kb, tb)| ta.cmp(tb).then_with(|| ka.cmp(kb)))
            .map(|(key, _)| key.clone());

        if let Some(key) = oldest {
            inner.entries.remove(&key);
            inner.timestamps.remove(&key);
        }
    }

    /// Remove every expired entry and return how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();

        // Snapshot the key set; removal mutates the maps mid-scan.
        let keys: Vec<String> = inner.timestamps.keys().cloned().collect();

        let mut removed = 0;
        for key in keys {
            let expired = inner
                .timestamps
                .get(&key)
                .is_some_and(|stamp| stamp.elapsed() >= self.ttl);
            if expired {
                inner.entries.remove(&key);
                inner.timestamps.remove(&key);
                removed += 1;
            }
        }

        removed
    }

    /// All currently stored keys, including expired-but-unswept ones.
    pub fn all_keys(&self) -> Vec<String> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    /// Aggregate statistics. `total_items` counts expired-but-unswept
    /// entries too, same as [`SimpleCache::all_keys`].
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_items: self.inner.lock().entries.len(),
            maxsize: self.capacity,
            ttl_seconds: self.ttl.as_secs(),
        }
    }
}

/// Read-through fetch: return the cached value for `key`, or invoke
/// `fetch` and cache a successful result.
///
/// A `fetch` that returns `None` is passed through without caching, so
/// the next call retries. Failures are never persisted as entries.
pub async fn get_cached<V, F, Fut>(cache: &SimpleCache<V>, key: &str, fetch: F) -> Option<V>
where
    V: Clone,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Option<V>>,
{
    if let Some(value) = cache.get(key) {
        return Some(value);
    }

    let fetched = fetch().await;
    if let Some(ref value) = fetched {
        cache.set(key, value.clone());
    }
    fetched
}
