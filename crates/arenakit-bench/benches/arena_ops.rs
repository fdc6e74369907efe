//! Criterion micro-benchmarks for arena allocation against the global heap.

use std::alloc::Layout;
use std::hint::black_box;

use allocator_api2::alloc::Global;
use allocator_api2::vec::Vec;
use arenakit_arena::{LockedStackArena, StackAllocator, StackArena};
use arenakit_resource::{PolymorphicAllocator, StackResource};
use criterion::{criterion_group, criterion_main, Criterion};

const ELEMS: usize = 256;

/// Benchmark: fill a pre-sized Vec<u64> of 256 elements on the global heap.
fn bench_vec_global(c: &mut Criterion) {
    c.bench_function("vec_256_global", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity_in(ELEMS, Global);
            for i in 0..ELEMS as u64 {
                v.push(i);
            }
            black_box(&v);
        });
    });
}

/// Benchmark: the same fill through a StackAllocator. Dropping the Vec
/// frees its single block LIFO so the cursor rewinds every iteration.
fn bench_vec_stack_arena(c: &mut Criterion) {
    let arena = StackArena::<4096>::new();
    c.bench_function("vec_256_stack_arena", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity_in(ELEMS, StackAllocator::<u64, _>::new(&arena));
            for i in 0..ELEMS as u64 {
                v.push(i);
            }
            black_box(&v);
        });
    });
}

/// Benchmark: the same fill on a mutex-guarded arena.
fn bench_vec_locked_arena(c: &mut Criterion) {
    let arena = LockedStackArena::<4096>::new();
    c.bench_function("vec_256_locked_arena", |b| {
        b.iter(|| {
            let mut v = Vec::with_capacity_in(ELEMS, StackAllocator::<u64, _>::new(&arena));
            for i in 0..ELEMS as u64 {
                v.push(i);
            }
            black_box(&v);
        });
    });
}

/// Benchmark: the same fill through a PolymorphicAllocator over an arena.
fn bench_vec_polymorphic(c: &mut Criterion) {
    let arena = StackArena::<4096>::new();
    let resource = StackResource::from_arena(&arena);
    c.bench_function("vec_256_polymorphic_arena", |b| {
        b.iter(|| {
            let mut v: Vec<u64, PolymorphicAllocator> =
                Vec::with_capacity_in(ELEMS, PolymorphicAllocator::with_resource(&resource));
            for i in 0..ELEMS as u64 {
                v.push(i);
            }
            black_box(&v);
        });
    });
}

/// Benchmark: 64 small bump allocations followed by a reset.
fn bench_bump_then_reset(c: &mut Criterion) {
    let mut arena = StackArena::<4096>::new();
    let layout = Layout::from_size_align(48, 8).unwrap();
    c.bench_function("bump_64x48_reset", |b| {
        b.iter(|| {
            for _ in 0..64 {
                black_box(arena.allocate(layout).unwrap());
            }
            arena.reset();
        });
    });
}

/// Benchmark: growth from empty, where the last block extends in place.
fn bench_vec_growth_in_place(c: &mut Criterion) {
    let arena = StackArena::<8192>::new();
    c.bench_function("vec_growth_stack_arena", |b| {
        b.iter(|| {
            let mut v = Vec::new_in(StackAllocator::<u32, _>::new(&arena));
            for i in 0..1024u32 {
                v.push(i);
            }
            black_box(&v);
        });
    });
}

criterion_group!(
    benches,
    bench_vec_global,
    bench_vec_stack_arena,
    bench_vec_locked_arena,
    bench_vec_polymorphic,
    bench_bump_then_reset,
    bench_vec_growth_in_place
);
criterion_main!(benches);
