//! Bounded least-recently-used cache.
//!
//! Entries live in a slot vector threaded into a doubly linked list from
//! most to least recently used, with a hash map from key to slot. Vacated
//! slots are recycled through a free list. A [`Position`] names a slot
//! together with its generation, so it survives promotion and reordering
//! and goes stale once its entry is removed or evicted.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::collections::HashMap;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;

use tracing::trace;

use crate::config::CacheConfig;
use crate::error::CacheError;

const NIL: usize = usize::MAX;

/// Stable reference to a cache entry.
///
/// Resolving a position never promotes the entry. A position whose entry
/// has been removed or evicted resolves to `None`, even if its slot has
/// since been reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Position {
    slot: usize,
    generation: u32,
}

#[derive(Clone)]
struct Slot<K, V> {
    entry: Option<(K, V)>,
    prev: usize,
    next: usize,
    generation: u32,
}

/// A cache holding at most `cache_size` entries, evicting the least
/// recently used one when full.
///
/// Lookups that count as a use ([`get`](Self::get), [`find`](Self::find),
/// [`at`](Self::at), ...) take `&mut self` because they reorder entries.
/// [`peek`](Self::peek) and [`contains_key`](Self::contains_key) do not.
/// For shared use across threads see
/// [`SharedLruCache`](crate::SharedLruCache).
#[derive(Clone)]
pub struct LruCache<K, V, S = RandomState> {
    slots: Vec<Slot<K, V>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    map: HashMap<K, usize, S>,
    cache_size: usize,
}

impl<K: Hash + Eq + Clone, V> LruCache<K, V, RandomState> {
    /// Create an empty cache bounded to `cache_size` entries.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn new(cache_size: usize) -> Self {
        Self::with_hasher(cache_size, RandomState::new())
    }

    /// Create an empty cache from `config`.
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self::new(config.cache_size))
    }
}

impl<K, V, S> LruCache<K, V, S> {
    /// Create an empty cache using `hasher` for its key map.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn with_hasher(cache_size: usize, hasher: S) -> Self {
        assert!(cache_size > 0, "LruCache cache_size must be non-zero");
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            map: HashMap::with_hasher(hasher),
            cache_size,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Maximum number of entries kept.
    pub fn cache_size(&self) -> usize {
        self.cache_size
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: &self.slots,
            front: self.head,
            back: self.tail,
            len: self.map.len(),
        }
    }

    /// Entries with mutable values, from most to least recently used.
    ///
    /// Iterating does not promote entries. Creating the iterator copies the
    /// list links of every slot, vacant ones included, into a temporary
    /// vector, so it costs O(slots) time and memory up front.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let nodes = self
            .slots
            .iter_mut()
            .map(|slot| MutNode {
                prev: slot.prev,
                next: slot.next,
                entry: slot.entry.as_mut().map(|(k, v)| (&*k, v)),
            })
            .collect();
        IterMut {
            nodes,
            front: self.head,
            back: self.tail,
            len: self.map.len(),
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Values from most to least recently used.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// The most recently used entry, without promotion.
    pub fn peek_mru(&self) -> Option<(&K, &V)> {
        self.entry(self.head)
    }

    /// The least recently used entry, the next to be evicted.
    pub fn peek_lru(&self) -> Option<(&K, &V)> {
        self.entry(self.tail)
    }

    /// Resolve `pos` without promotion.
    pub fn entry_at(&self, pos: Position) -> Option<(&K, &V)> {
        self.resolve(pos).and_then(|idx| self.entry(idx))
    }

    /// Resolve `pos` to a mutable value without promotion.
    pub fn entry_at_mut(&mut self, pos: Position) -> Option<(&K, &mut V)> {
        let idx = self.resolve(pos)?;
        self.slots[idx].entry.as_mut().map(|(k, v)| (&*k, v))
    }

    fn entry(&self, idx: usize) -> Option<(&K, &V)> {
        self.slots
            .get(idx)
            .and_then(|slot| slot.entry.as_ref())
            .map(|(k, v)| (k, v))
    }

    fn resolve(&self, pos: Position) -> Option<usize> {
        let slot = self.slots.get(pos.slot)?;
        (slot.generation == pos.generation && slot.entry.is_some()).then_some(pos.slot)
    }

    fn position(&self, idx: usize) -> Position {
        Position {
            slot: idx,
            generation: self.slots[idx].generation,
        }
    }

    fn link_order(&self) -> impl Iterator<Item = usize> + '_ {
        std::iter::successors((self.head != NIL).then_some(self.head), move |&idx| {
            let next = self.slots[idx].next;
            (next != NIL).then_some(next)
        })
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        if prev == NIL {
            self.head = next;
        } else {
            self.slots[prev].next = next;
        }
        if next == NIL {
            self.tail = prev;
        } else {
            self.slots[next].prev = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head == NIL {
            self.tail = idx;
        } else {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
    }

    fn promote(&mut self, idx: usize) {
        if self.head != idx {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    /// Place an entry in a free slot at the front of the list.
    fn occupy(&mut self, key: K, value: V) -> usize {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx].entry = Some((key, value));
                idx
            }
            None => {
                self.slots.push(Slot {
                    entry: Some((key, value)),
                    prev: NIL,
                    next: NIL,
                    generation: 0,
                });
                self.slots.len() - 1
            }
        };
        self.push_front(idx);
        idx
    }

    /// Unlink a slot, retire its generation and return its entry.
    fn vacate(&mut self, idx: usize) -> Option<(K, V)> {
        self.unlink(idx);
        let slot = &mut self.slots[idx];
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(idx);
        slot.entry.take()
    }

    fn value_mut(&mut self, idx: usize) -> &mut V {
        match &mut self.slots[idx].entry {
            Some((_, value)) => value,
            None => unreachable!("slot {idx} is linked from the key map but vacant"),
        }
    }
}

impl<K, V, S> LruCache<K, V, S>
where
    K: Hash + Eq + Clone,
    S: BuildHasher,
{
    /// Look up `key`, marking it most recently used.
    pub fn get<Q>(&mut self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.slots[idx].entry.as_ref().map(|(_, v)| v)
    }

    /// Look up `key` mutably, marking it most recently used.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        self.slots[idx].entry.as_mut().map(|(_, v)| v)
    }

    /// Position of `key`, marking it most recently used.
    pub fn find<Q>(&mut self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.promote(idx);
        Some(self.position(idx))
    }

    /// Look up `key` without changing its recency.
    pub fn peek<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = *self.map.get(key)?;
        self.entry(idx).map(|(_, v)| v)
    }

    /// Position of `key` without changing its recency.
    pub fn peek_position<Q>(&self, key: &Q) -> Option<Position>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.get(key).map(|&idx| self.position(idx))
    }

    /// Whether `key` is cached. Does not promote.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.map.contains_key(key)
    }

    /// Number of entries for `key`: zero or one. Does not promote.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        usize::from(self.contains_key(key))
    }

    /// Value for `key`, marking it most recently used, or
    /// [`CacheError::KeyNotFound`].
    pub fn at<Q>(&mut self, key: &Q) -> Result<&mut V, CacheError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(CacheError::KeyNotFound)
    }

    /// Value for `key`, inserting `V::default()` first if absent.
    ///
    /// Either way the entry becomes most recently used. Inserting may
    /// evict the least recently used entry.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(key, V::default)
    }

    /// Value for `key`, inserting the result of `make` first if absent.
    ///
    /// `make` runs only on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: K, make: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        let idx = match self.map.get(&key).copied() {
            Some(idx) => {
                self.promote(idx);
                idx
            }
            None => self.insert_new(key, make()),
        };
        self.value_mut(idx)
    }

    /// Like [`get_or_insert_with`](Self::get_or_insert_with) for a fallible
    /// constructor. Nothing is inserted when `make` fails.
    pub fn get_or_try_insert_with<F, E>(&mut self, key: K, make: F) -> Result<&mut V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let idx = match self.map.get(&key).copied() {
            Some(idx) => {
                self.promote(idx);
                idx
            }
            None => self.insert_new(key, make()?),
        };
        Ok(self.value_mut(idx))
    }

    /// Insert `value` under `key` unless the key is present.
    ///
    /// Returns the entry's position and whether an insertion happened. An
    /// existing entry keeps its value and its recency. A new entry becomes
    /// most recently used and may evict the least recently used one.
    pub fn insert(&mut self, key: K, value: V) -> (Position, bool) {
        if let Some(&idx) = self.map.get(&key) {
            return (self.position(idx), false);
        }
        let idx = self.insert_new(key, value);
        (self.position(idx), true)
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let idx = self.map.remove(key)?;
        self.vacate(idx).map(|(_, v)| v)
    }

    /// Remove the entry at `pos`. Returns `None` if `pos` is stale.
    pub fn remove_at(&mut self, pos: Position) -> Option<(K, V)> {
        let idx = self.resolve(pos)?;
        let (key, value) = self.vacate(idx)?;
        self.map.remove(&key);
        Some((key, value))
    }

    /// Remove and return the least recently used entry.
    pub fn pop_lru(&mut self) -> Option<(K, V)> {
        if self.tail == NIL {
            return None;
        }
        let (key, value) = self.vacate(self.tail)?;
        self.map.remove(&key);
        Some((key, value))
    }

    /// Keep only the entries for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        for idx in 0..self.slots.len() {
            let retained = match &mut self.slots[idx].entry {
                Some((key, value)) => keep(&*key, value),
                None => continue,
            };
            if !retained {
                if let Some((key, _)) = self.vacate(idx) {
                    self.map.remove(&key);
                }
            }
        }
    }

    /// Remove every entry. Outstanding positions become stale.
    pub fn clear(&mut self) {
        self.map.clear();
        self.free.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.prev = NIL;
            slot.next = NIL;
            self.free.push(idx);
        }
        self.head = NIL;
        self.tail = NIL;
    }

    /// Change the entry limit, evicting least recently used entries until
    /// the cache fits.
    ///
    /// # Panics
    ///
    /// Panics if `cache_size` is zero.
    pub fn set_cache_size(&mut self, cache_size: usize) {
        assert!(cache_size > 0, "LruCache cache_size must be non-zero");
        self.cache_size = cache_size;
        self.clean();
    }

    fn insert_new(&mut self, key: K, value: V) -> usize {
        let idx = self.occupy(key.clone(), value);
        self.map.insert(key, idx);
        self.clean();
        idx
    }

    /// Evict from the tail until the entry limit holds.
    fn clean(&mut self) {
        while self.map.len() > self.cache_size {
            let Some((key, _)) = self.vacate(self.tail) else {
                break;
            };
            self.map.remove(&key);
            trace!(
                len = self.map.len(),
                cache_size = self.cache_size,
                "evicted least recently used entry"
            );
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for LruCache<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V, S> IntoIterator for &'a LruCache<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut LruCache<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// Iterator over cache entries, most recently used first.
pub struct Iter<'a, K, V> {
    slots: &'a [Slot<K, V>],
    front: usize,
    back: usize,
    len: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let slot = &self.slots[self.front];
        self.front = slot.next;
        self.len -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let slot = &self.slots[self.back];
        self.back = slot.prev;
        self.len -= 1;
        slot.entry.as_ref().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterator over entries with mutable values, most recently used first.
pub struct IterMut<'a, K, V> {
    nodes: Vec<MutNode<'a, K, V>>,
    front: usize,
    back: usize,
    len: usize,
}

struct MutNode<'a, K, V> {
    prev: usize,
    next: usize,
    entry: Option<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let node = &mut self.nodes[self.front];
        self.front = node.next;
        self.len -= 1;
        node.entry.take()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }
        let node = &mut self.nodes[self.back];
        self.back = node.prev;
        self.len -= 1;
        node.entry.take()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// Iterator over cache keys, most recently used first.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// Iterator over cache values, most recently used first.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys<S>(cache: &LruCache<&'static str, i32, S>) -> Vec<&'static str> {
        cache.keys().copied().collect()
    }

    fn abc() -> LruCache<&'static str, i32> {
        let mut cache = LruCache::new(3);
        cache.insert("a", 1);
        cache.insert("b", 2);
        cache.insert("c", 3);
        cache
    }

    #[test]
    fn insertion_order_is_mru_first() {
        let cache = abc();
        assert_eq!(keys(&cache), ["c", "b", "a"]);
        assert_eq!(cache.peek_mru(), Some((&"c", &3)));
        assert_eq!(cache.peek_lru(), Some((&"a", &1)));
    }

    #[test]
    fn get_promotes_and_protects_from_eviction() {
        let mut cache = abc();
        assert_eq!(cache.get("a"), Some(&1));
        cache.insert("d", 4);
        assert_eq!(keys(&cache), ["d", "a", "c"]);
        assert!(!cache.contains_key("b"));
    }

    #[test]
    fn peek_does_not_promote() {
        let mut cache = abc();
        assert_eq!(cache.peek("a"), Some(&1));
        cache.insert("d", 4);
        assert!(!cache.contains_key("a"));
    }

    #[test]
    fn insert_never_overwrites() {
        let mut cache = abc();
        let before = cache.peek_position("a").unwrap();
        let (pos, inserted) = cache.insert("a", 100);
        assert!(!inserted);
        assert_eq!(pos, before);
        assert_eq!(cache.peek("a"), Some(&1));
        assert_eq!(keys(&cache), ["c", "b", "a"]);
    }

    #[test]
    fn default_insert_then_update() {
        let mut cache: LruCache<String, u32> = LruCache::new(2);
        *cache.get_or_insert_default("hits".into()) += 1;
        *cache.get_or_insert_default("hits".into()) += 1;
        assert_eq!(cache.peek("hits"), Some(&2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn at_reports_missing_key() {
        let mut cache = abc();
        assert_eq!(cache.at("z"), Err(CacheError::KeyNotFound));
        *cache.at("a").unwrap() = 10;
        assert_eq!(keys(&cache), ["a", "c", "b"]);
        assert_eq!(cache.peek("a"), Some(&10));
    }

    #[test]
    fn make_runs_only_on_miss() {
        let mut cache: LruCache<&str, String> = LruCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            cache.get_or_insert_with("re", || {
                calls += 1;
                "compiled".to_owned()
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn failed_make_inserts_nothing() {
        let mut cache: LruCache<&str, i32> = LruCache::new(2);
        let result = cache.get_or_try_insert_with("bad", || Err::<i32, _>("parse error"));
        assert_eq!(result, Err("parse error"));
        assert!(cache.is_empty());
        let ok = cache.get_or_try_insert_with("good", || Ok::<_, &str>(7));
        assert_eq!(ok, Ok(&mut 7));
    }

    #[test]
    fn positions_survive_reordering() {
        let mut cache = abc();
        let pos = cache.find("b").unwrap();
        cache.get("a");
        cache.get("c");
        assert_eq!(cache.entry_at(pos), Some((&"b", &2)));
        if let Some((_, v)) = cache.entry_at_mut(pos) {
            *v = 20;
        }
        assert_eq!(cache.peek("b"), Some(&20));
    }

    #[test]
    fn stale_positions_resolve_to_none() {
        let mut cache = abc();
        let pos = cache.find("a").unwrap();
        assert_eq!(cache.remove("a"), Some(1));
        assert_eq!(cache.entry_at(pos), None);

        // The freed slot is reused by the next insertion.
        let (fresh, _) = cache.insert("z", 26);
        assert_eq!(cache.entry_at(pos), None);
        assert_eq!(cache.entry_at(fresh), Some((&"z", &26)));
        assert_eq!(cache.remove_at(pos), None);
    }

    #[test]
    fn evicted_position_is_stale() {
        let mut cache = abc();
        let oldest = cache.peek_position("a").unwrap();
        cache.insert("d", 4);
        assert_eq!(cache.entry_at(oldest), None);
    }

    #[test]
    fn remove_at_returns_entry() {
        let mut cache = abc();
        let pos = cache.peek_position("b").unwrap();
        assert_eq!(cache.remove_at(pos), Some(("b", 2)));
        assert_eq!(keys(&cache), ["c", "a"]);
        assert_eq!(cache.count("b"), 0);
    }

    #[test]
    fn pop_lru_drains_in_order() {
        let mut cache = abc();
        assert_eq!(cache.pop_lru(), Some(("a", 1)));
        assert_eq!(cache.pop_lru(), Some(("b", 2)));
        assert_eq!(cache.pop_lru(), Some(("c", 3)));
        assert_eq!(cache.pop_lru(), None);
    }

    #[test]
    fn shrinking_evicts_lru_first() {
        let mut cache = abc();
        cache.set_cache_size(1);
        assert_eq!(keys(&cache), ["c"]);
        cache.set_cache_size(5);
        cache.insert("x", 0);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn clear_invalidates_positions() {
        let mut cache = abc();
        let pos = cache.peek_position("c").unwrap();
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.iter().count(), 0);
        cache.insert("q", 9);
        assert_eq!(cache.entry_at(pos), None);
        assert_eq!(keys(&cache), ["q"]);
    }

    #[test]
    fn iterators_are_double_ended() {
        let cache = abc();
        let reversed: Vec<_> = cache.values().rev().copied().collect();
        assert_eq!(reversed, [1, 2, 3]);
        let mut iter = cache.iter();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next(), Some((&"c", &3)));
        assert_eq!(iter.next_back(), Some((&"a", &1)));
        assert_eq!(iter.next(), Some((&"b", &2)));
        assert_eq!(iter.next_back(), None);
    }

    #[test]
    fn iter_mut_follows_recency_after_slot_reuse() {
        let mut cache = abc();
        cache.remove("b");
        cache.insert("d", 4);
        cache.get("a");
        let mut iter = cache.iter_mut();
        assert_eq!(iter.len(), 3);
        assert_eq!(iter.next_back().map(|(k, _)| *k), Some("c"));
        if let Some((_, v)) = iter.next() {
            *v = 100;
        }
        assert_eq!(iter.next().map(|(k, _)| *k), Some("d"));
        assert!(iter.next().is_none());
        assert!(iter.next_back().is_none());
        assert_eq!(keys(&cache), ["a", "d", "c"]);
        assert_eq!(cache.peek("a"), Some(&100));
    }

    #[test]
    fn iter_mut_updates_without_promoting() {
        let mut cache = abc();
        for (_, v) in cache.iter_mut() {
            *v *= 10;
        }
        assert_eq!(keys(&cache), ["c", "b", "a"]);
        let values: Vec<_> = (&cache).into_iter().map(|(_, v)| *v).collect();
        assert_eq!(values, [30, 20, 10]);
    }

    #[test]
    fn retain_keeps_order() {
        let mut cache = abc();
        cache.retain(|_, v| *v != 2);
        assert_eq!(keys(&cache), ["c", "a"]);
        cache.insert("d", 4);
        assert_eq!(keys(&cache), ["d", "c", "a"]);
    }

    #[test]
    fn clone_is_independent() {
        let mut original = abc();
        let copy = original.clone();
        original.get("a");
        assert_eq!(keys(&copy), ["c", "b", "a"]);
        assert_eq!(keys(&original), ["a", "c", "b"]);
    }

    #[test]
    fn debug_lists_entries_mru_first() {
        let cache = abc();
        assert_eq!(format!("{cache:?}"), r#"{"c": 3, "b": 2, "a": 1}"#);
    }

    #[test]
    #[should_panic(expected = "non-zero")]
    fn zero_capacity_panics() {
        let _ = LruCache::<u8, u8>::new(0);
    }

    #[test]
    fn from_config_rejects_zero() {
        assert!(LruCache::<u8, u8>::from_config(&CacheConfig::new(0)).is_err());
        let cache = LruCache::<u8, u8>::from_config(&CacheConfig::default()).unwrap();
        assert_eq!(cache.cache_size(), CacheConfig::DEFAULT_CACHE_SIZE);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Clone, Debug)]
        enum Op {
            Insert(u8, u16),
            Get(u8),
            Remove(u8),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..16, any::<u16>()).prop_map(|(k, v)| Op::Insert(k, v)),
                (0u8..16).prop_map(Op::Get),
                (0u8..16).prop_map(Op::Remove),
            ]
        }

        proptest! {
            #[test]
            fn matches_reference_model(
                cache_size in 1usize..6,
                ops in proptest::collection::vec(op(), 1..80),
            ) {
                let mut cache = LruCache::new(cache_size);
                // Most recently used at the front.
                let mut model: Vec<(u8, u16)> = Vec::new();

                for op in ops {
                    match op {
                        Op::Insert(k, v) => {
                            let (_, inserted) = cache.insert(k, v);
                            let present = model.iter().any(|&(mk, _)| mk == k);
                            prop_assert_eq!(inserted, !present);
                            if !present {
                                model.insert(0, (k, v));
                                model.truncate(cache_size);
                            }
                        }
                        Op::Get(k) => {
                            let expected = model.iter().position(|&(mk, _)| mk == k);
                            let got = cache.get(&k).copied();
                            match expected {
                                Some(i) => {
                                    let entry = model.remove(i);
                                    prop_assert_eq!(got, Some(entry.1));
                                    model.insert(0, entry);
                                }
                                None => prop_assert_eq!(got, None),
                            }
                        }
                        Op::Remove(k) => {
                            let expected = model
                                .iter()
                                .position(|&(mk, _)| mk == k)
                                .map(|i| model.remove(i).1);
                            prop_assert_eq!(cache.remove(&k), expected);
                        }
                    }
                    prop_assert!(cache.len() <= cache.cache_size());
                    let actual: Vec<(u8, u16)> = cache.iter().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(&actual, &model);
                    let backwards: Vec<(u8, u16)> =
                        cache.iter().rev().map(|(k, v)| (*k, *v)).collect();
                    prop_assert_eq!(backwards.len(), model.len());
                }
            }
        }
    }
}
