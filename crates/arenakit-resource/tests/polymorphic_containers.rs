//! Integration test: containers allocating through memory resources.
//!
//! Checks that a polymorphic vector routes every call through its
//! resource, that the default resource is picked up at construction, and
//! that resources over the same arena are interchangeable.

mod common;

use allocator_api2::vec::Vec;
use arenakit_arena::StackArena;
use arenakit_resource::{
    get_default_resource, new_delete_resource, null_memory_resource, reset_default_resource,
    set_default_resource, MemoryResource, PolymorphicAllocator, ResourceError, StackResource,
};
use arenakit_test_utils::CountingAllocator;
use common::RecordingResource;
use parking_lot::Mutex;

static DEFAULT_GUARD: Mutex<()> = parking_lot::const_mutex(());

#[test]
fn vector_routes_through_recording_resource() {
    let recording = RecordingResource::new(new_delete_resource());
    {
        let mut v: Vec<u64, _> = Vec::new_in(PolymorphicAllocator::<u8>::with_resource(&recording));
        for i in 0..100 {
            v.push(i);
        }
        assert_eq!(v.len(), 100);
        assert!(!recording.allocations().is_empty());
    }
    assert_eq!(recording.live_bytes(), 0);
    assert_eq!(
        recording.allocations().len(),
        recording.deallocations().len()
    );
}

#[test]
fn recording_over_arena_spills_to_fallback() {
    let counting = CountingAllocator::new();
    let arena = StackArena::<64, _>::with_fallback(counting.clone());
    let stack = StackResource::from_arena(&arena);
    let recording = RecordingResource::new(&stack);
    {
        let mut v: Vec<u32, _> = Vec::new_in(PolymorphicAllocator::<u8>::with_resource(&recording));
        v.extend(0..64u32);
        assert_eq!(v[63], 63);
    }
    assert!(counting.allocations() >= 1);
    assert_eq!(counting.live_bytes(), 0);
    assert_eq!(recording.live_bytes(), 0);
}

#[test]
fn default_resource_swap_is_observed_by_new_allocators() {
    let _guard = DEFAULT_GUARD.lock();
    let previous = set_default_resource(null_memory_resource());
    let failing: Vec<u8, PolymorphicAllocator> = Vec::new_in(PolymorphicAllocator::new());
    let mut failing = failing;
    assert!(failing.try_reserve(8).is_err());

    assert!(reset_default_resource().is_equal(null_memory_resource()));
    assert!(previous.is_equal(get_default_resource()));

    let mut working: Vec<u8, PolymorphicAllocator> = Vec::new_in(PolymorphicAllocator::new());
    working.push(1);
    assert_eq!(working.len(), 1);
}

#[test]
fn scoped_override_restores_through_returned_previous() {
    let _guard = DEFAULT_GUARD.lock();
    let previous = set_default_resource(null_memory_resource());
    {
        let mut scoped: Vec<u8, PolymorphicAllocator> = Vec::new_in(PolymorphicAllocator::new());
        assert!(scoped.try_reserve(1).is_err());
    }
    set_default_resource(previous);
    set_default_resource(previous);
    assert!(get_default_resource().is_equal(previous));
    assert!(!get_default_resource().is_equal(null_memory_resource()));

    let mut restored: Vec<u8, PolymorphicAllocator> = Vec::new_in(PolymorphicAllocator::new());
    restored.push(7);
    assert_eq!(restored[0], 7);
}

#[test]
fn resources_over_one_arena_free_each_others_blocks() {
    let arena = StackArena::<128>::new();
    let first = StackResource::from_arena(&arena);
    let second = StackResource::from_arena(&arena);
    assert!(first.is_equal(&second));

    let ptr = first.allocate(32, 8).unwrap();
    assert_eq!(arena.used(), 32);
    unsafe { second.deallocate(ptr, 32, 8) };
    assert_eq!(arena.used(), 0);
}

#[test]
fn null_resource_errors_are_typed() {
    let alloc = PolymorphicAllocator::<u32>::with_resource(null_memory_resource());
    assert_eq!(alloc.allocate_array(4), Err(ResourceError::NullResource));
}
