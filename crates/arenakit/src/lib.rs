//! arenakit: stack arenas, polymorphic memory resources, and a bounded LRU cache.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all arenakit sub-crates. For most users, adding `arenakit` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use allocator_api2::vec::Vec;
//! use arenakit::prelude::*;
//!
//! // A 256-byte arena on the stack, spilling to the heap when full.
//! let arena = StackArena::<256>::new();
//! let mut short: Vec<u32, _> = Vec::new_in(StackAllocator::<u32, _>::new(&arena));
//! short.extend(0..8);
//! assert!(arena.used() > 0);
//!
//! // The same arena seen through a type-erased resource.
//! let resource = StackResource::from_arena(&arena);
//! let mut erased: Vec<u8, PolymorphicAllocator> =
//!     Vec::new_in(PolymorphicAllocator::with_resource(&resource));
//! erased.push(1);
//!
//! // A cache of built values, evicting the least recently used.
//! let mut cache = LruCache::new(2);
//! cache.get_or_insert_with("x+", || short.len());
//! assert_eq!(cache.peek("x+"), Some(&8));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`arena`] | `arenakit-arena` | Bump arenas, storage backends, `StackAllocator` |
//! | [`resource`] | `arenakit-resource` | `MemoryResource`, default resource, `PolymorphicAllocator` |
//! | [`cache`] | `arenakit-cache` | `LruCache`, `SharedLruCache`, positions |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Bump arenas and their allocator handle (`arenakit-arena`).
///
/// Provides [`arena::Arena`] over inline or heap [`arena::Storage`], with
/// [`arena::StackAllocator`] as the `Copy` handle containers hold.
pub use arenakit_arena as arena;

/// Memory resources and the polymorphic allocator (`arenakit-resource`).
///
/// The [`resource::MemoryResource`] trait, the process-wide default
/// resource, and [`resource::PolymorphicAllocator`].
pub use arenakit_resource as resource;

/// Bounded least-recently-used cache (`arenakit-cache`).
///
/// [`cache::LruCache`] for single-threaded use and
/// [`cache::SharedLruCache`] behind a mutex.
pub use arenakit_cache as cache;

/// Common imports for typical arenakit usage.
///
/// ```rust
/// use arenakit::prelude::*;
/// ```
pub mod prelude {
    // Arenas
    pub use arenakit_arena::{
        ArenaConfig, ArenaError, HeapArena, LockedStackArena, RawArena, StackAllocator,
        StackArena,
    };

    // Resources
    pub use arenakit_resource::{
        get_default_resource, new_delete_resource, null_memory_resource, set_default_resource,
        MemoryResource, PolymorphicAllocator, ResourceError, StackResource,
    };

    // Cache
    pub use arenakit_cache::{CacheConfig, CacheError, LruCache, Position, SharedLruCache};
}
