//! Mutex-guarded LRU cache for use across threads.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};

use parking_lot::Mutex;

use crate::config::CacheConfig;
use crate::error::CacheError;
use crate::lru::LruCache;

/// An [`LruCache`] behind a `parking_lot::Mutex`.
///
/// Every operation takes the lock for its whole duration, including the
/// value constructor in [`get_or_insert_with`](Self::get_or_insert_with),
/// so concurrent misses on one key build the value once. Values are
/// returned by clone since references cannot outlive the lock.
pub struct SharedLruCache<K, V, S = RandomState> {
    inner: Mutex<LruCache<K, V, S>>,
}

impl<K: Hash + Eq + Clone, V> SharedLruCache<K, V, RandomState> {
    /// Create an empty shared cache bounded to `cache_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn new(cache_size: usize) -> Self {
        Self::from_cache(LruCache::new(cache_size))
    }

    /// Create an empty shared cache from `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        LruCache::from_config(config).map(Self::from_cache)
    }
}

impl<K, V, S> SharedLruCache<K, V, S> {
    /// Create an empty shared cache using `hasher` for its key map.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn with_hasher(cache_size: usize, hasher: S) -> Self {
        Self::from_cache(LruCache::with_hasher(cache_size, hasher))
    }

    /// Wrap an existing cache.
    pub fn from_cache(cache: LruCache<K, V, S>) -> Self {
        Self {
            inner: Mutex::new(cache),
        }
    }

    /// Unwrap the inner cache.
    pub fn into_inner(self) -> LruCache<K, V, S> {
        self.inner.into_inner()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    /// Maximum number of entries kept.
    pub fn cache_size(&self) -> usize {
        self.inner.lock().cache_size()
    }

    /// Run `f` with exclusive access to the inner cache.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut LruCache<K, V, S>) -> R) -> R {
        f(&mut self.inner.lock())
    }
}

impl<K, V, S> SharedLruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Clone of the value for `key`, marking it most recently used.
    pub fn get_cloned<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Whether `key` is cached. Does not promote.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().contains_key(key)
    }

    /// Insert unless present. Returns whether an insertion happened.
    pub fn insert(&self, key: K, value: V) -> bool {
        self.inner.lock().insert(key, value).1
    }

    /// Clone of the value for `key`, building it with `make` on a miss.
    pub fn get_or_insert_with<F>(&self, key: K, make: F) -> V
    where
        F: FnOnce() -> V,
        V: Clone,
    {
        self.inner.lock().get_or_insert_with(key, make).clone()
    }

    /// Fallible [`get_or_insert_with`](Self::get_or_insert_with). Nothing is
    /// inserted when `make` fails.
    pub fn get_or_try_insert_with<F, E>(&self, key: K, make: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
        V: Clone,
    {
        self.inner
            .lock()
            .get_or_try_insert_with(key, make)
            .map(|v| v.clone())
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.lock().remove(key)
    }

    /// Change the entry limit, evicting as needed.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn set_cache_size(&self, cache_size: usize) {
        self.inner.lock().set_cache_size(cache_size);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.lock().clear();
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for SharedLruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_lock() {
            Some(cache) => f.debug_tuple("SharedLruCache").field(&*cache).finish(),
            None => f.write_str("SharedLruCache(<locked>)"),
        }
    }
}
