//! Low-level primitives for arena memory operations.
//!
//! Alignment arithmetic and the offset/address conversions that every
//! arena operation is built on. The pointer arithmetic is kept here so
//! the bump logic in `arena.rs` reads as plain offset bookkeeping.

#![allow(unsafe_code)]

use std::ptr::NonNull;

/// Round `n` up to the nearest multiple of `align`.
///
/// `align` must be a power of two. Returns `None` if the rounded value
/// does not fit in `usize`.
#[inline]
pub(crate) fn align_up(n: usize, align: usize) -> Option<usize> {
    debug_assert!(align.is_power_of_two());
    let mask = align - 1;
    n.checked_add(mask).map(|v| v & !mask)
}

/// Byte offset of `ptr` from `base` when `ptr` lies in `[base, base + len]`.
///
/// The upper bound is inclusive: a zero-sized block handed out while the
/// buffer is full sits exactly one past the last byte.
#[inline]
pub(crate) fn offset_within(base: NonNull<u8>, len: usize, ptr: NonNull<u8>) -> Option<usize> {
    let base = base.as_ptr() as usize;
    let addr = ptr.as_ptr() as usize;
    match addr.checked_sub(base) {
        Some(offset) if offset <= len => Some(offset),
        _ => None,
    }
}

/// Pointer `offset` bytes past `base`.
///
/// # Safety
///
/// `offset` must not exceed the size of the allocation `base` points into.
#[inline]
pub(crate) unsafe fn at_offset(base: NonNull<u8>, offset: usize) -> NonNull<u8> {
    // SAFETY: the caller keeps `offset` within (or one past) the allocation,
    // so the result stays in bounds and cannot wrap to null.
    unsafe { base.add(offset) }
}
