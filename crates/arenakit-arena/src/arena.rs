//! The bump arena and its fallback path.
//!
//! [`Arena`] hands out blocks from a fixed [`Storage`] by advancing a
//! cursor. There is no per-block bookkeeping: freeing the most recent block
//! rolls the cursor back, freeing any other in-buffer block is accepted and
//! ignored, and the whole buffer is reclaimed by [`Arena::reset`]. When the
//! buffer cannot hold a request the arena forwards it to an optional
//! fallback allocator, and frees of pointers outside the buffer go to that
//! same fallback.
//!
//! Every block size is rounded up to the arena alignment, so the cursor is
//! always aligned and every returned pointer is too.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::ptr::NonNull;

use allocator_api2::alloc::{Allocator, Global};
use tracing::{debug, error, trace};

use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::lock::{CursorState, LockPolicy, Locked, Unlocked};
use crate::raw;
use crate::storage::{HeapBuffer, InlineBuffer, Storage, MAX_ALIGN};

/// An arena with `N` bytes of inline storage.
///
/// Declared as a local, the buffer lives on the stack.
pub type StackArena<const N: usize, F = Global, L = Unlocked> = Arena<InlineBuffer<N>, F, L>;

/// A [`StackArena`] whose cursor is guarded by a mutex, shareable across
/// threads when its fallback is `Sync`.
pub type LockedStackArena<const N: usize, F = Global> = Arena<InlineBuffer<N>, F, Locked>;

/// An arena over a heap block sized at runtime.
pub type HeapArena<F = Global, L = Unlocked> = Arena<HeapBuffer, F, L>;

/// Snapshot of arena usage counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ArenaStats {
    /// Bytes currently between the buffer start and the cursor.
    pub used: usize,
    /// Largest value of `used` since construction or the last reset.
    pub peak: usize,
    /// Buffer size in bytes.
    pub capacity: usize,
    /// Blocks served from the buffer over the arena's lifetime.
    pub allocations: u64,
    /// Blocks served by the fallback allocator.
    pub fallback_allocations: u64,
    /// Blocks returned to the fallback allocator.
    pub fallback_deallocations: u64,
}

/// Object-safe arena interface consumed by
/// [`StackAllocator`](crate::StackAllocator).
pub trait RawArena {
    /// Allocate a block for `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ArenaError>;

    /// Return a block to the arena.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](RawArena::allocate) on
    /// this arena with the same `layout`, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ArenaError>;

    /// Extend a block without moving it. Returns `false` if it cannot.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated with `old`, and
    /// `new.size() >= old.size()`.
    unsafe fn grow_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool;

    /// Shrink a block without moving it. Returns `false` if it cannot.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated with `old`, and
    /// `new.size() <= old.size()`.
    unsafe fn shrink_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool;

    /// Alignment of every in-buffer block.
    fn alignment(&self) -> usize;

    /// Whether `ptr` points into the arena's buffer.
    fn owns(&self, ptr: NonNull<u8>) -> bool;
}

/// A bump allocator over storage `S` with optional fallback `F`.
///
/// `L` selects the lock policy: [`Unlocked`] arenas are `!Sync`, while
/// [`Locked`] arenas serialise every operation through a
/// `parking_lot::Mutex`. The cursor is stored as an offset, so an arena
/// with no outstanding borrows may be moved freely.
///
/// A fallback allocator must not allocate from the arena it backs.
pub struct Arena<S, F = Global, L: LockPolicy = Unlocked> {
    storage: S,
    alignment: usize,
    state: L::Cell,
    fallback: Option<F>,
}

impl<const N: usize, F, L: LockPolicy> Arena<InlineBuffer<N>, F, L> {
    /// Create an inline arena aligned to [`MAX_ALIGN`] with no fallback.
    ///
    /// Requests that do not fit report [`ArenaError::Exhausted`].
    pub fn new() -> Self {
        Self::build(InlineBuffer::new(), MAX_ALIGN, None)
    }

    /// Create an inline arena aligned to [`MAX_ALIGN`] that forwards
    /// overflowing requests to `fallback`.
    pub fn with_fallback(fallback: F) -> Self {
        Self::build(InlineBuffer::new(), MAX_ALIGN, Some(fallback))
    }

    /// Create an inline arena with a custom block alignment.
    ///
    /// `alignment` must be a power of two no larger than [`MAX_ALIGN`].
    pub fn with_alignment(alignment: usize, fallback: Option<F>) -> Result<Self, ArenaError> {
        Self::from_storage(InlineBuffer::new(), alignment, fallback)
    }
}

/// The default arena falls back to `F::default()` when full.
impl<const N: usize, F: Default, L: LockPolicy> Default for Arena<InlineBuffer<N>, F, L> {
    fn default() -> Self {
        Self::with_fallback(F::default())
    }
}

impl<F, L: LockPolicy> Arena<HeapBuffer, F, L> {
    /// Create a heap-backed arena from `config`.
    ///
    /// The buffer is allocated with the configured alignment; a fallback
    /// is installed only when `config.use_fallback` is set.
    pub fn from_config(config: &ArenaConfig) -> Result<Self, ArenaError>
    where
        F: Default,
    {
        config.validate()?;
        let fallback = config.use_fallback.then(F::default);
        let storage = HeapBuffer::new(config.capacity, config.alignment)?;
        Self::from_storage(storage, config.alignment, fallback)
    }
}

impl<S: Storage, F, L: LockPolicy> Arena<S, F, L> {
    /// Build an arena over caller-supplied storage.
    ///
    /// `alignment` must be a power of two and at most `storage.max_align()`.
    pub fn from_storage(storage: S, alignment: usize, fallback: Option<F>) -> Result<Self, ArenaError> {
        if !alignment.is_power_of_two() {
            return Err(ArenaError::InvalidConfig {
                reason: format!("alignment {alignment} is not a power of two"),
            });
        }
        if alignment > storage.max_align() {
            return Err(ArenaError::InvalidConfig {
                reason: format!(
                    "alignment {alignment} exceeds storage alignment {}",
                    storage.max_align()
                ),
            });
        }
        Ok(Self::build(storage, alignment, fallback))
    }

    fn build(storage: S, alignment: usize, fallback: Option<F>) -> Self {
        Self {
            storage,
            alignment,
            state: L::new_cell(CursorState::default()),
            fallback,
        }
    }

    fn snapshot(&self) -> CursorState {
        L::with(&self.state, |state| *state)
    }

    /// Offset of `ptr` if a block of `size` bytes at `ptr` belongs to the
    /// buffer. A zero-sized block may sit exactly at the end.
    fn block_offset(&self, ptr: NonNull<u8>, size: usize) -> Option<usize> {
        let capacity = self.storage.capacity();
        raw::offset_within(self.storage.base(), capacity, ptr)
            .filter(|&offset| offset < capacity || size == 0)
    }

    /// Buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Alignment of every in-buffer block.
    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Bytes between the buffer start and the cursor.
    pub fn used(&self) -> usize {
        self.snapshot().cursor
    }

    /// Bytes still free in the buffer.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.used()
    }

    /// High-water mark of [`used`](Self::used).
    pub fn peak(&self) -> usize {
        self.snapshot().peak
    }

    /// Whether `ptr` points into the buffer.
    pub fn owns(&self, ptr: NonNull<u8>) -> bool {
        let capacity = self.storage.capacity();
        raw::offset_within(self.storage.base(), capacity, ptr).is_some_and(|o| o < capacity)
    }

    /// Whether a fallback allocator is installed.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// The fallback allocator, if any.
    pub fn fallback(&self) -> Option<&F> {
        self.fallback.as_ref()
    }

    /// Usage counters, read in one critical section.
    pub fn stats(&self) -> ArenaStats {
        let state = self.snapshot();
        ArenaStats {
            used: state.cursor,
            peak: state.peak,
            capacity: self.storage.capacity(),
            allocations: state.allocations,
            fallback_allocations: state.fallback_allocations,
            fallback_deallocations: state.fallback_deallocations,
        }
    }

    /// Rewind the cursor and peak to zero.
    ///
    /// The exclusive borrow proves no handle to the arena is alive. Blocks
    /// obtained from the fallback are unaffected. Lifetime counters in
    /// [`ArenaStats`] are kept.
    pub fn reset(&mut self) {
        let state = L::get_mut(&mut self.state);
        state.cursor = 0;
        state.peak = 0;
    }

    /// Rewind the cursor and peak to zero through a shared reference.
    ///
    /// # Safety
    ///
    /// No block previously handed out from the buffer may be read or
    /// written after this call, and none may be passed to
    /// [`deallocate`](Self::deallocate).
    pub unsafe fn reset_unchecked(&self) {
        L::with(&self.state, |state| {
            state.cursor = 0;
            state.peak = 0;
        });
    }
}

impl<S: Storage, F: Allocator, L: LockPolicy> Arena<S, F, L> {
    /// Allocate a block for `layout`.
    ///
    /// In-buffer blocks are `layout.size()` rounded up to the arena
    /// alignment, and the returned slice has that rounded length. Blocks
    /// from the fallback are requested with the original layout.
    pub fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ArenaError> {
        if layout.align() > self.alignment {
            return Err(ArenaError::AlignmentTooLarge {
                required: layout.align(),
                supported: self.alignment,
            });
        }

        let base = self.storage.base();
        let capacity = self.storage.capacity();
        let rounded = raw::align_up(layout.size(), self.alignment);

        L::with(&self.state, |state| {
            let remaining = capacity - state.cursor;
            if let Some(size) = rounded.filter(|&size| size <= remaining) {
                let offset = state.cursor;
                state.cursor += size;
                state.peak = state.peak.max(state.cursor);
                state.allocations += 1;
                // SAFETY: `offset + size <= capacity`, so the block lies
                // within the storage region.
                let ptr = unsafe { raw::at_offset(base, offset) };
                return Ok(NonNull::slice_from_raw_parts(ptr, size));
            }

            let Some(fallback) = &self.fallback else {
                let requested = rounded.unwrap_or(layout.size());
                debug!(requested, remaining, capacity, "arena exhausted");
                return Err(ArenaError::Exhausted {
                    requested,
                    remaining,
                    capacity,
                });
            };

            let block = fallback
                .allocate(layout)
                .map_err(|_| ArenaError::FallbackFailed {
                    requested: layout.size(),
                })?;
            state.fallback_allocations += 1;
            trace!(
                size = layout.size(),
                align = layout.align(),
                remaining,
                "arena full, served from fallback"
            );
            Ok(block)
        })
    }

    /// Return a block to the arena.
    ///
    /// Freeing the most recent in-buffer block rolls the cursor back to its
    /// start. Freeing any other in-buffer block does nothing. A pointer
    /// outside the buffer is passed to the fallback, or reported as
    /// [`ArenaError::ForeignPointer`] when there is none.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](Self::allocate) on this
    /// arena with the same `layout`, and must not be used afterwards.
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ArenaError> {
        let offset = self.block_offset(ptr, layout.size());

        L::with(&self.state, |state| {
            if let Some(offset) = offset {
                if let Some(size) = raw::align_up(layout.size(), self.alignment) {
                    if offset.checked_add(size) == Some(state.cursor) {
                        state.cursor = offset;
                    }
                }
                return Ok(());
            }

            match &self.fallback {
                Some(fallback) => {
                    // SAFETY: the pointer is outside the buffer, so by the
                    // caller's contract it came from `fallback.allocate`
                    // with this layout.
                    unsafe { fallback.deallocate(ptr, layout) };
                    state.fallback_deallocations += 1;
                    Ok(())
                }
                None => {
                    let addr = ptr.as_ptr() as usize;
                    error!(addr, size = layout.size(), "freed pointer not owned by arena");
                    Err(ArenaError::ForeignPointer { addr })
                }
            }
        })
    }

    /// Extend the most recent in-buffer block without moving it.
    ///
    /// Returns `false` when the block is not the last one, lives in the
    /// fallback, or the buffer lacks room.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated from this arena with `old`, and
    /// `new.size() >= old.size()`.
    pub unsafe fn grow_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool {
        if new.align() > self.alignment {
            return false;
        }
        let Some(offset) = self.block_offset(ptr, old.size()) else {
            return false;
        };
        let (Some(old_size), Some(new_size)) = (
            raw::align_up(old.size(), self.alignment),
            raw::align_up(new.size(), self.alignment),
        ) else {
            return false;
        };
        let capacity = self.storage.capacity();

        L::with(&self.state, |state| {
            if offset + old_size != state.cursor || new_size > capacity - offset {
                return false;
            }
            state.cursor = offset + new_size;
            state.peak = state.peak.max(state.cursor);
            true
        })
    }

    /// Shrink an in-buffer block without moving it.
    ///
    /// Always succeeds for in-buffer blocks; the cursor moves back only
    /// when the block is the most recent one. Returns `false` for fallback
    /// blocks.
    ///
    /// # Safety
    ///
    /// `ptr` must be a live block allocated from this arena with `old`, and
    /// `new.size() <= old.size()`.
    pub unsafe fn shrink_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool {
        if new.align() > self.alignment {
            return false;
        }
        let Some(offset) = self.block_offset(ptr, old.size()) else {
            return false;
        };
        let (Some(old_size), Some(new_size)) = (
            raw::align_up(old.size(), self.alignment),
            raw::align_up(new.size(), self.alignment),
        ) else {
            return false;
        };

        L::with(&self.state, |state| {
            if offset + old_size == state.cursor {
                state.cursor = offset + new_size;
            }
            true
        })
    }
}

impl<S: Storage, F: Allocator, L: LockPolicy> RawArena for Arena<S, F, L> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ArenaError> {
        Self::allocate(self, layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) -> Result<(), ArenaError> {
        // SAFETY: forwarded under the same contract.
        unsafe { Self::deallocate(self, ptr, layout) }
    }

    unsafe fn grow_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool {
        // SAFETY: forwarded under the same contract.
        unsafe { Self::grow_in_place(self, ptr, old, new) }
    }

    unsafe fn shrink_in_place(&self, ptr: NonNull<u8>, old: Layout, new: Layout) -> bool {
        // SAFETY: forwarded under the same contract.
        unsafe { Self::shrink_in_place(self, ptr, old, new) }
    }

    fn alignment(&self) -> usize {
        self.alignment
    }

    fn owns(&self, ptr: NonNull<u8>) -> bool {
        Self::owns(self, ptr)
    }
}

impl<S: Storage, F, L: LockPolicy> fmt::Debug for Arena<S, F, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.snapshot();
        f.debug_struct("Arena")
            .field("capacity", &self.storage.capacity())
            .field("alignment", &self.alignment)
            .field("used", &state.cursor)
            .field("peak", &state.peak)
            .field("has_fallback", &self.fallback.is_some())
            .field("locked", &L::IS_LOCKED)
            .finish()
    }
}
