//! Backing storage for arenas.
//!
//! A [`Storage`] is a fixed block of bytes that an [`Arena`](crate::Arena)
//! bumps through. Two backends are provided:
//!
//! - [`InlineBuffer`]: `N` bytes stored inside the arena value itself, so a
//!   local `StackArena` keeps its buffer on the stack.
//! - [`HeapBuffer`]: a single heap block whose size and alignment are chosen
//!   at runtime (see [`ArenaConfig`](crate::ArenaConfig)).
//!
//! Storage never reads or writes its own bytes. All access goes through
//! pointers handed out by the owning arena.

#![allow(unsafe_code)]

use std::alloc::{self, Layout};
use std::cell::UnsafeCell;
use std::fmt;
use std::mem::MaybeUninit;
use std::ptr::{self, NonNull};

use crate::error::ArenaError;

/// Maximum alignment guaranteed by [`InlineBuffer`].
///
/// Matches `alignof(max_align_t)` on mainstream 64-bit targets.
pub const MAX_ALIGN: usize = 16;

/// A fixed block of bytes owned by an arena.
///
/// # Safety
///
/// Implementors must guarantee that [`base`](Storage::base) points to a
/// region valid for reads and writes of [`capacity`](Storage::capacity)
/// bytes, aligned to at least [`max_align`](Storage::max_align), for as long
/// as the storage is neither moved nor dropped. Repeated calls on an unmoved
/// value must return the same pointer.
pub unsafe trait Storage {
    /// Start of the byte region.
    fn base(&self) -> NonNull<u8>;

    /// Size of the region in bytes.
    fn capacity(&self) -> usize;

    /// Alignment of [`base`](Storage::base).
    fn max_align(&self) -> usize;
}

/// `N` bytes of inline storage aligned to [`MAX_ALIGN`].
#[repr(C, align(16))]
pub struct InlineBuffer<const N: usize> {
    bytes: UnsafeCell<[MaybeUninit<u8>; N]>,
}

impl<const N: usize> InlineBuffer<N> {
    /// Create an uninitialised buffer.
    pub const fn new() -> Self {
        Self {
            bytes: UnsafeCell::new([MaybeUninit::uninit(); N]),
        }
    }
}

impl<const N: usize> Default for InlineBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for InlineBuffer<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineBuffer").field("capacity", &N).finish()
    }
}

// SAFETY: the buffer itself never touches its bytes. Concurrent access only
// happens through pointers issued by the owning arena, whose lock policy
// decides whether cursor updates are serialised.
unsafe impl<const N: usize> Sync for InlineBuffer<N> {}

// SAFETY: `bytes` lives inside `self`, is `N` bytes long, and the struct is
// `repr(align(16))`, so the pointer is aligned to `MAX_ALIGN`.
unsafe impl<const N: usize> Storage for InlineBuffer<N> {
    fn base(&self) -> NonNull<u8> {
        // SAFETY: `UnsafeCell::get` returns a pointer derived from a
        // reference, which is never null.
        unsafe { NonNull::new_unchecked(self.bytes.get().cast::<u8>()) }
    }

    fn capacity(&self) -> usize {
        N
    }

    fn max_align(&self) -> usize {
        MAX_ALIGN
    }
}

/// A heap block of runtime size and alignment.
pub struct HeapBuffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl HeapBuffer {
    /// Allocate `capacity` bytes aligned to `alignment`.
    ///
    /// A zero capacity allocates nothing. Aborts through
    /// [`std::alloc::handle_alloc_error`] if the system allocator fails, the
    /// same way `Vec` does.
    pub fn new(capacity: usize, alignment: usize) -> Result<Self, ArenaError> {
        let layout =
            Layout::from_size_align(capacity, alignment).map_err(|_| ArenaError::InvalidConfig {
                reason: format!("no valid layout for {capacity} bytes aligned to {alignment}"),
            })?;

        if capacity == 0 {
            let ptr = NonNull::new(ptr::without_provenance_mut::<u8>(alignment))
                .unwrap_or(NonNull::dangling());
            return Ok(Self { ptr, layout });
        }

        // SAFETY: `layout` has a non-zero size.
        let raw = unsafe { alloc::alloc(layout) };
        let ptr = NonNull::new(raw).unwrap_or_else(|| alloc::handle_alloc_error(layout));
        Ok(Self { ptr, layout })
    }
}

impl Drop for HeapBuffer {
    fn drop(&mut self) {
        if self.layout.size() != 0 {
            // SAFETY: `ptr` was returned by `alloc::alloc` with this exact
            // layout and is freed only here.
            unsafe { alloc::dealloc(self.ptr.as_ptr(), self.layout) };
        }
    }
}

impl fmt::Debug for HeapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapBuffer")
            .field("capacity", &self.layout.size())
            .field("alignment", &self.layout.align())
            .finish()
    }
}

// SAFETY: `HeapBuffer` exclusively owns its allocation; moving it between
// threads moves that ownership.
unsafe impl Send for HeapBuffer {}

// SAFETY: as for `InlineBuffer`, the buffer never touches its own bytes.
unsafe impl Sync for HeapBuffer {}

// SAFETY: `ptr` is either a live allocation of `layout` or, for zero
// capacity, a non-null pointer aligned to `layout.align()` that is never
// dereferenced. The heap block does not move when `HeapBuffer` moves.
unsafe impl Storage for HeapBuffer {
    fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    fn capacity(&self) -> usize {
        self.layout.size()
    }

    fn max_align(&self) -> usize {
        self.layout.align()
    }
}
