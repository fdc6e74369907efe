//! Benchmark workloads for the arenakit allocators and cache.
//!
//! Provides deterministic inputs shared by the criterion benches:
//!
//! - [`pattern_keys`]: distinct pattern-like key strings
//! - [`access_trace`]: a seeded key-index trace skewed towards a hot set
//! - [`warm_cache`]: an [`LruCache`] pre-filled from a key set

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use arenakit_cache::LruCache;

/// Generate `n` distinct keys shaped like short regex sources.
pub fn pattern_keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("[a-z]{{{}}}|\\d+_{i}", i % 7 + 1)).collect()
}

/// Generate a deterministic trace of `len` indices into a key set of
/// `key_count` keys.
///
/// Roughly four accesses in five go to the first `hot` keys, the rest
/// spread over the whole set. The sequence depends only on `seed`.
pub fn access_trace(len: usize, key_count: usize, hot: usize, seed: u64) -> Vec<usize> {
    assert!(key_count > 0 && hot > 0 && hot <= key_count);
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let draw = (state >> 33) as usize;
            if draw % 5 == 0 {
                draw % key_count
            } else {
                draw % hot
            }
        })
        .collect()
}

/// Build a cache of `cache_size` entries filled with the first keys of
/// `keys`, each mapped to its length.
pub fn warm_cache(keys: &[String], cache_size: usize) -> LruCache<String, usize> {
    let mut cache = LruCache::new(cache_size);
    for key in keys.iter().take(cache_size) {
        cache.insert(key.clone(), key.len());
    }
    cache
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_keys_are_distinct() {
        let keys = pattern_keys(50);
        let unique: std::collections::HashSet<&String> = keys.iter().collect();
        assert_eq!(unique.len(), 50);
    }

    #[test]
    fn access_trace_deterministic_and_in_range() {
        let a = access_trace(1000, 200, 20, 42);
        let b = access_trace(1000, 200, 20, 42);
        assert_eq!(a, b);
        assert!(a.iter().all(|&i| i < 200));
        let hot = a.iter().filter(|&&i| i < 20).count();
        assert!(hot > 600, "trace should favour the hot set, got {hot}");
    }

    #[test]
    fn warm_cache_is_full() {
        let keys = pattern_keys(150);
        let cache = warm_cache(&keys, 100);
        assert_eq!(cache.len(), 100);
        assert_eq!(cache.peek_lru().map(|(k, _)| k), Some(&keys[0]));
    }
}
