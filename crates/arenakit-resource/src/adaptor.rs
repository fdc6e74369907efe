//! Adapting typed allocators and arenas into memory resources.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use allocator_api2::alloc::Allocator;
use arenakit_arena::{
    AllocatorId, AllocatorIdentity, Arena, LockPolicy, RawArena, StackAllocator, Storage,
};

use crate::error::ResourceError;
use crate::resource::{MemoryResource, MAX_ALIGN};

/// A [`MemoryResource`] over an [`Allocator`].
///
/// Every request is padded to a multiple of [`MAX_ALIGN`] and aligned to at
/// least `MAX_ALIGN`, matching the granularity of arena handles. Two
/// adaptors compare equal when the wrapped allocators report the same
/// [`AllocatorId`]. An adaptor never equals a resource that passes layouts
/// through unpadded, even one over the same memory source.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceAdaptor<A> {
    alloc: A,
}

/// A resource drawing from an arena through a byte-typed handle.
pub type StackResource<'a, A> = ResourceAdaptor<StackAllocator<'a, u8, A>>;

impl<A: Allocator + AllocatorIdentity> ResourceAdaptor<A> {
    /// Wrap `alloc`.
    pub fn new(alloc: A) -> Self {
        Self { alloc }
    }

    /// A copy of the wrapped allocator.
    pub fn get_allocator(&self) -> A
    where
        A: Clone,
    {
        self.alloc.clone()
    }

    fn padded(layout: Layout) -> Result<Layout, ResourceError> {
        layout
            .align_to(MAX_ALIGN)
            .map(|l| l.pad_to_align())
            .map_err(|_| ResourceError::InvalidLayout {
                bytes: layout.size(),
                alignment: layout.align(),
            })
    }
}

impl<'a, A: RawArena + ?Sized> StackResource<'a, A> {
    /// A resource allocating from `arena`.
    pub fn from_arena(arena: &'a A) -> Self {
        Self::new(StackAllocator::new(arena))
    }
}

impl<A: Allocator + AllocatorIdentity> MemoryResource for ResourceAdaptor<A> {
    fn do_allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ResourceError> {
        let padded = Self::padded(layout)?;
        self.alloc
            .allocate(padded)
            .map_err(|_| ResourceError::AllocationFailed {
                bytes: layout.size(),
                alignment: layout.align(),
            })
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // A layout that cannot be padded was never handed out.
        let Ok(padded) = Self::padded(layout) else {
            return;
        };
        // SAFETY: `ptr` was allocated with `padded` by this allocator or one
        // with the same id, which can free it.
        unsafe { self.alloc.deallocate(ptr, padded) }
    }

    fn do_is_equal(&self, other: &dyn MemoryResource) -> bool {
        other.allocator_id() == self.allocator_id()
    }

    fn allocator_id(&self) -> Option<AllocatorId> {
        Some(self.alloc.allocator_id().padded_to(MAX_ALIGN))
    }
}

/// Arenas are resources in their own right, reporting arena errors
/// unchanged. Layouts reach the arena unpadded, so an arena equals only
/// itself, never a [`StackResource`] over it.
impl<S: Storage, F: Allocator, L: LockPolicy> MemoryResource for Arena<S, F, L> {
    fn do_allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ResourceError> {
        Ok(Arena::allocate(self, layout)?)
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: forwarded under the caller's contract. A foreign pointer
        // is logged by the arena.
        let _ = unsafe { Arena::deallocate(self, ptr, layout) };
    }

    fn do_is_equal(&self, other: &dyn MemoryResource) -> bool {
        other.allocator_id() == self.allocator_id()
    }

    fn allocator_id(&self) -> Option<AllocatorId> {
        Some(StackAllocator::<u8, Self>::new(self).allocator_id())
    }
}
