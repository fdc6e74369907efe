//! Bounded least-recently-used cache.
//!
//! [`LruCache`] keeps at most `cache_size` entries and evicts the least
//! recently used one when an insertion would exceed that bound. Lookups
//! through [`get`](LruCache::get) and friends count as a use; the `peek`
//! family does not. Entries are addressed by key or by a [`Position`],
//! which stays valid across reordering and goes stale once the entry
//! leaves the cache.
//!
//! [`SharedLruCache`] wraps the cache in a `parking_lot::Mutex` for use
//! from several threads.
//!
//! # Example
//!
//! ```
//! use arenakit_cache::LruCache;
//!
//! let mut cache = LruCache::new(2);
//! cache.insert("a", 1);
//! cache.insert("b", 2);
//! cache.get("a");
//! cache.insert("c", 3);
//! assert!(!cache.contains_key("b"));
//! assert_eq!(cache.keys().copied().collect::<Vec<_>>(), ["c", "a"]);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lru;
pub mod shared;

// Public re-exports for the primary API surface.
pub use config::CacheConfig;
pub use error::CacheError;
pub use lru::{Iter, IterMut, Keys, LruCache, Position, Values};
pub use shared::SharedLruCache;
