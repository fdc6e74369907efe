//! Fixed-buffer bump arenas with an optional fallback allocator.
//!
//! An [`Arena`] serves allocations from a fixed buffer by advancing a
//! cursor. Requests that do not fit go to a fallback allocator (the global
//! heap by default), so containers stay usable once the buffer is full.
//! Freeing the most recent block rewinds the cursor; any other free of an
//! in-buffer block is ignored until [`Arena::reset`].
//!
//! # Architecture
//!
//! ```text
//! container (allocator_api2::vec::Vec, Box, ...)
//! └── StackAllocator<'a, T, A>   (Copy handle, borrows the arena)
//!     └── A: RawArena
//!         └── Arena<S, F, L>
//!             ├── S: Storage      InlineBuffer<N> | HeapBuffer
//!             ├── L: LockPolicy   Unlocked (Cell) | Locked (Mutex)
//!             └── F: Allocator    fallback, used when the buffer is full
//! ```
//!
//! # Thread safety
//!
//! [`Unlocked`] arenas are `!Sync`. [`Locked`] arenas run each operation
//! under a `parking_lot::Mutex` and are `Sync` when their fallback is.
//!
//! # Example
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use arenakit_arena::{StackAllocator, StackArena};
//!
//! let arena = StackArena::<64>::new();
//! let mut v = Vec::new_in(StackAllocator::<u8, _>::new(&arena));
//! v.push(7u64);
//! assert!(arena.owns(std::ptr::NonNull::from(&v[0]).cast()));
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]

pub mod arena;
pub mod config;
pub mod error;
pub mod handle;
pub mod identity;
mod lock;
mod raw;
pub mod storage;

// Public re-exports for the primary API surface.
pub use arena::{Arena, ArenaStats, HeapArena, LockedStackArena, RawArena, StackArena};
pub use config::ArenaConfig;
pub use error::ArenaError;
pub use handle::StackAllocator;
pub use identity::{AllocatorId, AllocatorIdentity};
pub use lock::{LockPolicy, Locked, Unlocked};
pub use storage::{HeapBuffer, InlineBuffer, Storage, MAX_ALIGN};
