//! An allocator that dispatches through a `&dyn MemoryResource`.
//!
//! Containers parameterised by [`PolymorphicAllocator`] share one concrete
//! type whatever resource backs them:
//!
//! ```
//! use allocator_api2::vec::Vec;
//! use arenakit_arena::StackArena;
//! use arenakit_resource::{PolymorphicAllocator, StackResource};
//!
//! let arena = StackArena::<256>::new();
//! let resource = StackResource::from_arena(&arena);
//!
//! let mut on_arena: Vec<u32, PolymorphicAllocator> =
//!     Vec::new_in(PolymorphicAllocator::with_resource(&resource));
//! let mut on_heap: Vec<u32, PolymorphicAllocator> = Vec::new_in(PolymorphicAllocator::new());
//! on_arena.push(1);
//! on_heap.push(2);
//! assert!(arena.used() > 0);
//! assert!(on_arena.allocator() != on_heap.allocator());
//! ```

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use allocator_api2::alloc::{AllocError, Allocator};
use tracing::debug;

use crate::default::get_default_resource;
use crate::error::ResourceError;
use crate::resource::MemoryResource;

/// Allocator for `T` backed by a type-erased [`MemoryResource`].
pub struct PolymorphicAllocator<'r, T = u8> {
    resource: &'r dyn MemoryResource,
    _marker: PhantomData<fn() -> T>,
}

impl<'r, T> PolymorphicAllocator<'r, T> {
    /// An allocator on the current default resource.
    ///
    /// The resource is captured now; later changes to the default do not
    /// affect this allocator.
    pub fn new() -> Self {
        Self::with_resource(get_default_resource())
    }

    /// An allocator on `resource`.
    pub fn with_resource(resource: &'r dyn MemoryResource) -> Self {
        Self {
            resource,
            _marker: PhantomData,
        }
    }

    /// The backing resource.
    pub fn resource(&self) -> &'r dyn MemoryResource {
        self.resource
    }

    /// The same allocator for element type `U`.
    pub fn rebind<U>(self) -> PolymorphicAllocator<'r, U> {
        PolymorphicAllocator::with_resource(self.resource)
    }

    /// The allocator a copied container should use: one on the current
    /// default resource, not on this allocator's resource.
    pub fn select_on_container_copy_construction(&self) -> Self {
        Self::new()
    }

    /// Allocate uninitialised storage for `n` values of `T`.
    pub fn allocate_array(&self, n: usize) -> Result<NonNull<T>, ResourceError> {
        let layout = Self::array_layout(n)?;
        Ok(self.resource.do_allocate(layout)?.cast())
    }

    /// Return storage obtained from [`allocate_array`](Self::allocate_array).
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate_array(n)` on an allocator equal to this
    /// one, with the same `n`, and must not be used afterwards.
    pub unsafe fn deallocate_array(&self, ptr: NonNull<T>, n: usize) {
        if let Ok(layout) = Self::array_layout(n) {
            // SAFETY: the caller guarantees `ptr` came from this resource
            // with `layout`.
            unsafe { self.resource.do_deallocate(ptr.cast(), layout) }
        }
    }

    fn array_layout(n: usize) -> Result<Layout, ResourceError> {
        Layout::array::<T>(n).map_err(|_| ResourceError::InvalidLayout {
            bytes: n.saturating_mul(size_of::<T>()),
            alignment: align_of::<T>(),
        })
    }
}

impl<T> Default for PolymorphicAllocator<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r, T> From<&'r dyn MemoryResource> for PolymorphicAllocator<'r, T> {
    fn from(resource: &'r dyn MemoryResource) -> Self {
        Self::with_resource(resource)
    }
}

impl<T> Clone for PolymorphicAllocator<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PolymorphicAllocator<'_, T> {}

impl<'b, T, U> PartialEq<PolymorphicAllocator<'b, U>> for PolymorphicAllocator<'_, T> {
    fn eq(&self, other: &PolymorphicAllocator<'b, U>) -> bool {
        self.resource.is_equal(other.resource)
    }
}

impl<T> fmt::Debug for PolymorphicAllocator<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolymorphicAllocator")
            .field("resource", &self.resource)
            .field("elem", &std::any::type_name::<T>())
            .finish()
    }
}

// SAFETY: blocks come from the resource's `do_allocate`. Equal allocators
// share resources that compare equal, and those can free each other's
// blocks by the `MemoryResource` contract.
unsafe impl<T> Allocator for PolymorphicAllocator<'_, T> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        self.resource.do_allocate(layout).map_err(|err| {
            debug!(%err, size = layout.size(), align = layout.align(), "resource allocation failed");
            AllocError
        })
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: the `Allocator` contract makes `ptr` a live block from
        // this allocator with `layout`.
        unsafe { self.resource.do_deallocate(ptr, layout) }
    }
}
