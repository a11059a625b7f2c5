//! Allocation and snapshot throughput of the kernel object pool

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use hle_kobj::{KernelObjectPool, Semaphore, SemaphoreState, CAPACITY};
use hle_savestate::{StateWrap, Stateful};

fn filled_pool(count: usize) -> KernelObjectPool {
    let mut pool = KernelObjectPool::new();
    for _ in 0..count {
        pool.insert(Semaphore::boxed("bench", SemaphoreState::default()));
    }
    pool
}

fn bench_create_destroy(c: &mut Criterion) {
    let mut pool = filled_pool(CAPACITY / 2);
    c.bench_function("pool_create_destroy", |b| {
        b.iter(|| {
            let handle = pool.insert(Semaphore::boxed("x", SemaphoreState::default()));
            // The slot is released so the pool never fills up
            let _ = pool.destroy(black_box(handle));
        })
    });
}

fn bench_snapshot(c: &mut Criterion) {
    let mut pool = filled_pool(1024);
    c.bench_function("pool_snapshot_1024", |b| {
        b.iter(|| {
            let mut w = StateWrap::writer();
            pool.do_state(&mut w).unwrap();
            black_box(w.into_bytes())
        })
    });

    let mut w = StateWrap::writer();
    pool.do_state(&mut w).unwrap();
    let bytes = w.into_bytes();
    let mut target = KernelObjectPool::new();
    c.bench_function("pool_restore_1024", |b| {
        b.iter(|| target.do_state(&mut StateWrap::reader(black_box(&bytes))).unwrap())
    });
}

criterion_group!(benches, bench_create_destroy, bench_snapshot);
criterion_main!(benches);
