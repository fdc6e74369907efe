//! The memory resource trait.
//!
//! A [`MemoryResource`] is a type-erased source of raw memory. Callers go
//! through the provided entry points ([`allocate`](MemoryResource::allocate),
//! [`deallocate`](MemoryResource::deallocate),
//! [`is_equal`](MemoryResource::is_equal)); implementors supply the `do_*`
//! hooks.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::{self, NonNull};

use arenakit_arena::AllocatorId;
use tracing::error;

use crate::error::ResourceError;

/// Alignment used when callers do not ask for one.
pub const MAX_ALIGN: usize = arenakit_arena::MAX_ALIGN;

/// A polymorphic source of raw memory.
pub trait MemoryResource {
    /// Allocate a block for `layout`.
    fn do_allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ResourceError>;

    /// Release a block obtained from [`do_allocate`](Self::do_allocate).
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `do_allocate(layout)` on this
    /// resource, or on one it compares equal to, and must not be used
    /// afterwards.
    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// Whether blocks from `other` can be released through `self`.
    ///
    /// Only consulted when the two resources are distinct objects.
    fn do_is_equal(&self, other: &dyn MemoryResource) -> bool {
        let _ = other;
        false
    }

    /// Identity of the allocator backing this resource, if it has one.
    ///
    /// Resources reporting the same id are interchangeable.
    fn allocator_id(&self) -> Option<AllocatorId> {
        None
    }

    /// Allocate `bytes` bytes aligned to `alignment`.
    fn allocate(&self, bytes: usize, alignment: usize) -> Result<NonNull<u8>, ResourceError> {
        let layout = layout_for(bytes, alignment)?;
        Ok(self.do_allocate(layout)?.cast())
    }

    /// Release `bytes` bytes aligned to `alignment` at `ptr`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by [`allocate`](Self::allocate) with
    /// the same `bytes` and `alignment` on this resource, or on one it
    /// compares equal to, and must not be used afterwards.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, bytes: usize, alignment: usize) {
        match layout_for(bytes, alignment) {
            // SAFETY: forwarded under the caller's contract.
            Ok(layout) => unsafe { self.do_deallocate(ptr, layout) },
            Err(err) => error!(%err, "deallocate called with a layout no allocation can have"),
        }
    }

    /// Whether memory allocated from one resource can be freed by the other.
    fn is_equal(&self, other: &dyn MemoryResource) -> bool {
        (ptr::addr_eq(self, other) && self.allocator_id() == other.allocator_id())
            || self.do_is_equal(other)
    }
}

/// Whether `a` and `b` are the same resource object.
///
/// Zero-sized resources may share an address, so identity also requires
/// matching allocator ids.
pub(crate) fn same_resource(a: &dyn MemoryResource, b: &dyn MemoryResource) -> bool {
    ptr::addr_eq(a, b) && a.allocator_id() == b.allocator_id()
}

/// Layout for a byte-level request.
pub(crate) fn layout_for(bytes: usize, alignment: usize) -> Result<Layout, ResourceError> {
    Layout::from_size_align(bytes, alignment)
        .map_err(|_| ResourceError::InvalidLayout { bytes, alignment })
}

impl PartialEq for dyn MemoryResource + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl PartialEq for dyn MemoryResource + Sync + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other)
    }
}

impl std::fmt::Debug for dyn MemoryResource + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryResource")
            .field("addr", &(self as *const Self as *const ()))
            .field("allocator_id", &self.allocator_id())
            .finish()
    }
}

impl std::fmt::Debug for dyn MemoryResource + Sync + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self as &(dyn MemoryResource + '_), f)
    }
}
