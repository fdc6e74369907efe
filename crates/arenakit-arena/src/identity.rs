//! Allocator identity for type-erased equality checks.
//!
//! A type-erased memory resource cannot downcast its peer to compare the
//! wrapped allocators (arena handles borrow their arena and are not
//! `'static`). Instead each allocator reports an [`AllocatorId`]: two
//! allocators with equal ids can free each other's blocks. The id carries
//! the layout granularity applied before the memory source is reached, so
//! a padding wrapper never equals the unpadded source it wraps.

use allocator_api2::alloc::Global;

use crate::handle::StackAllocator;

/// Identifies the memory source behind an allocator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AllocatorId {
    kind: &'static str,
    addr: usize,
    granularity: usize,
}

impl AllocatorId {
    /// Create an id from a source kind and an address unique within it.
    ///
    /// Layouts reach the source unchanged (granularity 1).
    pub const fn new(kind: &'static str, addr: usize) -> Self {
        Self {
            kind,
            addr,
            granularity: 1,
        }
    }

    /// The same source, reached only with layouts padded to a multiple of
    /// `granularity` and aligned to at least `granularity`.
    pub const fn padded_to(self, granularity: usize) -> Self {
        Self {
            granularity,
            ..self
        }
    }

    /// The kind of memory source, e.g. `"global"` or `"stack"`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// Address distinguishing sources of the same kind.
    pub fn addr(&self) -> usize {
        self.addr
    }

    /// Size multiple and minimum alignment applied to every layout.
    pub fn granularity(&self) -> usize {
        self.granularity
    }
}

/// Allocators that can report which memory source they draw from.
pub trait AllocatorIdentity {
    /// Id shared by every allocator able to free this one's blocks.
    fn allocator_id(&self) -> AllocatorId;
}

impl AllocatorIdentity for Global {
    fn allocator_id(&self) -> AllocatorId {
        AllocatorId::new("global", 0)
    }
}

impl<T, A: ?Sized> AllocatorIdentity for StackAllocator<'_, T, A> {
    fn allocator_id(&self) -> AllocatorId {
        AllocatorId::new("stack", self.arena() as *const A as *const () as usize)
    }
}

impl<X: AllocatorIdentity + ?Sized> AllocatorIdentity for &X {
    fn allocator_id(&self) -> AllocatorId {
        (**self).allocator_id()
    }
}
