//! Process-wide stock resources.

#![allow(unsafe_code)]

use std::alloc::Layout;
use std::ptr::NonNull;

use allocator_api2::alloc::{Allocator, Global};
use arenakit_arena::{AllocatorId, AllocatorIdentity};

use crate::error::ResourceError;
use crate::resource::MemoryResource;

/// A `'static` resource usable from any thread.
pub type StaticResource = &'static (dyn MemoryResource + Sync);

/// Resource backed by the global heap.
///
/// Zero-sized requests return a dangling pointer aligned to the request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NewDeleteResource;

impl MemoryResource for NewDeleteResource {
    fn do_allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ResourceError> {
        Global
            .allocate(layout)
            .map_err(|_| ResourceError::AllocationFailed {
                bytes: layout.size(),
                alignment: layout.align(),
            })
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        // SAFETY: blocks of every resource equal to this one come from
        // `Global` with `layout`.
        unsafe { Global.deallocate(ptr, layout) }
    }

    fn do_is_equal(&self, other: &dyn MemoryResource) -> bool {
        other.allocator_id() == self.allocator_id()
    }

    fn allocator_id(&self) -> Option<AllocatorId> {
        Some(Global.allocator_id())
    }
}

/// Resource that refuses every allocation.
///
/// Useful as an upstream that must never be reached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NullMemoryResource;

impl MemoryResource for NullMemoryResource {
    fn do_allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, ResourceError> {
        Err(ResourceError::NullResource)
    }

    unsafe fn do_deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

pub(crate) static NEW_DELETE: NewDeleteResource = NewDeleteResource;
static NULL: NullMemoryResource = NullMemoryResource;

/// The global-heap resource singleton.
pub fn new_delete_resource() -> StaticResource {
    &NEW_DELETE
}

/// The null resource singleton.
pub fn null_memory_resource() -> StaticResource {
    &NULL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_delete_round_trips() {
        let resource = new_delete_resource();
        let ptr = resource.allocate(64, 32).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 32, 0);
        unsafe { ptr.as_ptr().write_bytes(0x5A, 64) };
        unsafe { resource.deallocate(ptr, 64, 32) };
    }

    #[test]
    fn zero_sized_request_is_aligned() {
        let ptr = new_delete_resource().allocate(0, 64).unwrap();
        assert_eq!(ptr.as_ptr() as usize % 64, 0);
        unsafe { new_delete_resource().deallocate(ptr, 0, 64) };
    }

    #[test]
    fn null_resource_always_fails() {
        let resource = null_memory_resource();
        for (bytes, alignment) in [(0, 1), (1, 1), (4096, 16)] {
            assert_eq!(
                resource.allocate(bytes, alignment),
                Err(ResourceError::NullResource)
            );
        }
    }

    #[test]
    fn singletons_compare_by_kind() {
        let heap = new_delete_resource();
        let null = null_memory_resource();
        assert!(heap.is_equal(heap));
        assert!(null.is_equal(null));
        assert!(!heap.is_equal(null));
        assert!(!null.is_equal(heap));
        assert!(heap.is_equal(&NewDeleteResource));
    }
}
