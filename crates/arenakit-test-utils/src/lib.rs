//! Test utilities and mock allocators for arenakit development.
//!
//! Provides [`CountingAllocator`], a global-heap allocator that records
//! every call it serves, and [`FailingAllocator`], which refuses every
//! request. Both are meant to sit behind an arena as its fallback so tests
//! can observe exactly when the fallback path is taken.

#![deny(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::alloc::Layout;
use std::ptr::NonNull;
use std::sync::Arc;

use allocator_api2::alloc::{AllocError, Allocator, Global};
use parking_lot::Mutex;

/// Counters shared by every clone of a [`CountingAllocator`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AllocCounters {
    pub allocations: usize,
    pub deallocations: usize,
    pub live_bytes: usize,
    pub peak_live_bytes: usize,
}

/// Allocator that forwards to [`Global`] and counts what passes through.
///
/// Clones share their counters, so a test can keep one clone for
/// inspection and hand the other to the code under test.
#[derive(Clone, Debug, Default)]
pub struct CountingAllocator {
    counters: Arc<Mutex<AllocCounters>>,
}

impl CountingAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all counters.
    pub fn counters(&self) -> AllocCounters {
        *self.counters.lock()
    }

    pub fn allocations(&self) -> usize {
        self.counters.lock().allocations
    }

    pub fn deallocations(&self) -> usize {
        self.counters.lock().deallocations
    }

    /// Bytes allocated and not yet freed.
    pub fn live_bytes(&self) -> usize {
        self.counters.lock().live_bytes
    }
}

#[allow(unsafe_code)]
// SAFETY: every call is forwarded unchanged to `Global`; the counters do not
// influence which blocks are returned.
unsafe impl Allocator for CountingAllocator {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        let block = Global.allocate(layout)?;
        let mut counters = self.counters.lock();
        counters.allocations += 1;
        counters.live_bytes += layout.size();
        counters.peak_live_bytes = counters.peak_live_bytes.max(counters.live_bytes);
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        {
            let mut counters = self.counters.lock();
            counters.deallocations += 1;
            counters.live_bytes -= layout.size();
        }
        // SAFETY: the caller guarantees `ptr` came from `allocate` on a
        // clone of this allocator, which means from `Global`.
        unsafe { Global.deallocate(ptr, layout) }
    }
}

/// Allocator whose every request fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FailingAllocator;

#[allow(unsafe_code)]
// SAFETY: no block is ever handed out, so there is nothing to free.
unsafe impl Allocator for FailingAllocator {
    fn allocate(&self, _layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        Err(AllocError)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}
}

#[cfg(test)]
#[allow(unsafe_code)]
mod tests {
    use super::*;

    #[test]
    fn counting_tracks_live_bytes() {
        let counting = CountingAllocator::new();
        let probe = counting.clone();
        let layout = Layout::from_size_align(24, 8).unwrap();
        let block = counting.allocate(layout).unwrap();
        assert_eq!(probe.live_bytes(), 24);
        unsafe { counting.deallocate(block.cast(), layout) };
        let counters = probe.counters();
        assert_eq!(counters.allocations, 1);
        assert_eq!(counters.deallocations, 1);
        assert_eq!(counters.live_bytes, 0);
        assert_eq!(counters.peak_live_bytes, 24);
    }

    #[test]
    fn failing_always_fails() {
        let layout = Layout::from_size_align(1, 1).unwrap();
        assert!(FailingAllocator.allocate(layout).is_err());
    }
}
