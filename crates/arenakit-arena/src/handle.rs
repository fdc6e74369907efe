//! Copyable allocator handles bound to an arena.
//!
//! A [`StackAllocator`] is a shared reference to an arena plus an element
//! type marker. It implements [`allocator_api2::alloc::Allocator`], so the
//! `allocator-api2` containers (`Vec`, `Box`, ...) can live in an arena:
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use arenakit_arena::{StackAllocator, StackArena};
//!
//! let arena = StackArena::<256>::new();
//! let mut v: Vec<u32, _> = Vec::new_in(StackAllocator::<u8, _>::new(&arena));
//! v.extend([1, 2, 3]);
//! assert!(arena.used() > 0);
//! ```
//!
//! The `'a` borrow keeps the arena alive and in place for as long as any
//! handle, or any container using one, exists.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

use allocator_api2::alloc::{AllocError, Allocator};
use tracing::debug;

use crate::arena::RawArena;
use crate::error::ArenaError;

/// Handle allocating `T`s from an arena of type `A`.
///
/// Handles are `Copy`; any number may refer to one arena. Two handles
/// compare equal when they refer to the same arena, whatever their element
/// types.
pub struct StackAllocator<'a, T, A: ?Sized> {
    arena: &'a A,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T, A: RawArena + ?Sized> StackAllocator<'a, T, A> {
    /// Bind a handle to `arena`.
    pub fn new(arena: &'a A) -> Self {
        Self {
            arena,
            _marker: PhantomData,
        }
    }

    /// Allocate uninitialised storage for `n` values of `T`.
    pub fn allocate_array(&self, n: usize) -> Result<NonNull<T>, ArenaError> {
        let layout = Layout::array::<T>(n).map_err(|_| ArenaError::LayoutOverflow {
            count: n,
            elem_size: size_of::<T>(),
        })?;
        Ok(self.arena.allocate(layout)?.cast())
    }

    /// Return storage obtained from [`allocate_array`](Self::allocate_array).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_array(n)` on a handle equal to this
    /// one, with the same `n`, and must not be used afterwards.
    pub unsafe fn deallocate_array(&self, ptr: NonNull<T>, n: usize) -> Result<(), ArenaError> {
        let layout = Layout::array::<T>(n).map_err(|_| ArenaError::LayoutOverflow {
            count: n,
            elem_size: size_of::<T>(),
        })?;
        // SAFETY: the caller guarantees `ptr` was allocated from this arena
        // with `layout`.
        unsafe { self.arena.deallocate(ptr.cast(), layout) }
    }
}

impl<'a, T, A: ?Sized> StackAllocator<'a, T, A> {
    /// The arena this handle allocates from.
    pub fn arena(&self) -> &'a A {
        self.arena
    }

    /// The same handle for element type `U`.
    pub fn rebind<U>(self) -> StackAllocator<'a, U, A> {
        StackAllocator {
            arena: self.arena,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, U, A: ?Sized> From<&StackAllocator<'a, T, A>> for StackAllocator<'a, U, A> {
    fn from(other: &StackAllocator<'a, T, A>) -> Self {
        other.rebind()
    }
}

impl<T, A: ?Sized> Clone for StackAllocator<'_, T, A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, A: ?Sized> Copy for StackAllocator<'_, T, A> {}

impl<'b, T, U, A: ?Sized> PartialEq<StackAllocator<'b, U, A>> for StackAllocator<'_, T, A> {
    fn eq(&self, other: &StackAllocator<'b, U, A>) -> bool {
        ptr::addr_eq(self.arena as *const A, other.arena as *const A)
    }
}

impl<T, A: ?Sized> Eq for StackAllocator<'_, T, A> {}

impl<T, A: ?Sized> fmt::Debug for StackAllocator<'_, T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackAllocator")
            .field("arena", &(self.arena as *const A as *const ()))
            .field("elem", &std::any::type_name::<T>())
            .finish()
    }
}

// SAFETY: blocks come from the arena, which keeps in-buffer blocks disjoint
// and valid while the `'a` borrow lasts; fallback blocks are valid per the
// fallback's own contract. Copies of a handle share one arena, so a block
// may be freed through any of them.
unsafe impl<T, A: RawArena + ?Sized> Allocator for StackAllocator<'_, T, A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.arena.allocate(layout).map_err(|err| {
            debug!(%err, size = layout.size(), align = layout.align(), "arena allocation failed");
            AllocError
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the `Allocator` contract makes `ptr` a block currently
        // allocated by this handle with `layout`.
        let result = unsafe { self.arena.deallocate(ptr, layout) };
        debug_assert!(result.is_ok(), "arena rejected deallocation: {result:?}");
    }

    unsafe fn grow(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        // SAFETY: `ptr` is live with `old_layout` and the caller guarantees
        // `new_layout.size() >= old_layout.size()`.
        if unsafe { self.arena.grow_in_place(ptr, old_layout, new_layout) } {
            return Ok(NonNull::slice_from_raw_parts(ptr, new_layout.size()));
        }

        let new_block = Allocator::allocate(self, new_layout)?;
        // SAFETY: the new block is at least `old_layout.size()` bytes and
        // does not overlap the old one, which is still live.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_block.cast::<u8>().as_ptr(), old_layout.size());
            Allocator::deallocate(self, ptr, old_layout);
        }
        Ok(new_block)
    }

    unsafe fn shrink(
        &self,
        ptr: NonNull<u8>,
        old_layout: Layout,
        new_layout: Layout,
    ) -> Result<NonNull<[u8]>, AllocError> {
        // SAFETY: `ptr` is live with `old_layout` and the caller guarantees
        // `new_layout.size() <= old_layout.size()`.
        if unsafe { self.arena.shrink_in_place(ptr, old_layout, new_layout) } {
            return Ok(NonNull::slice_from_raw_parts(ptr, new_layout.size()));
        }

        let new_block = Allocator::allocate(self, new_layout)?;
        // SAFETY: both blocks are live and disjoint; only the retained
        // prefix is copied.
        unsafe {
            ptr::copy_nonoverlapping(ptr.as_ptr(), new_block.cast::<u8>().as_ptr(), new_layout.size());
            Allocator::deallocate(self, ptr, old_layout);
        }
        Ok(new_block)
    }
}
