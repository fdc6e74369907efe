use std::alloc::Layout;
use std::ptr::NonNull;

use arenakit_resource::{MemoryResource, ResourceError};
use parking_lot::Mutex;

/// Forwards to an upstream resource and records every request.
pub struct RecordingResource<'u> {
    upstream: &'u dyn MemoryResource,
    allocations: Mutex<Vec<Layout>>,
    deallocations: Mutex<Vec<Layout>>,
}

impl<'u> RecordingResource<'u> {
    pub fn new(upstream: &'u dyn MemoryResource) -> Self {
        Self {
            upstream,
            allocations: Mutex::new(Vec::new()),
            deallocations: Mutex::new(Vec::new()),
        }
    }

    pub fn allocations(&self) -> Vec<Layout> {
        self.allocations.lock().clone()
    }

    pub fn deallocations(&self) -> Vec<Layout> {
        self.deallocations.lock().clone()
    }

    pub fn live_bytes(&self) -> usize {
        let allocated: usize = self.allocations.lock().iter().map(Layout::size).sum();
        let freed: usize = self.deallocations.lock().iter().map(Layout::size).sum();
        allocated - freed
    }
}

impl MemoryResource for RecordingResource<'_> {
    fn do_allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, ResourceError> {
        let block = self.upstream.do_allocate(layout)?;
        self.allocations.lock().push(layout);
        Ok(block)
    }

    unsafe fn do_deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.deallocations.lock().push(layout);
        unsafe { self.upstream.do_deallocate(ptr, layout) }
    }
}
