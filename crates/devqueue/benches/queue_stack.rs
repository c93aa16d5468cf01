//! Active-Queue Stack Benchmarks

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use devqueue::prelude::*;

fn make_manager() -> QueueManager {
    ConfigBuilder::new()
        .simulated_gpus(2)
        .build()
        .unwrap()
        .build_manager()
        .unwrap()
}

fn bench_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("active_queue_stack");
    let manager = make_manager();

    group.bench_function("push_pop", |b| {
        b.iter(|| {
            black_box(manager.push_queue(DeviceClass::Gpu, 0).unwrap());
            manager.pop_queue().unwrap();
        });
    });

    group.bench_function("nested_push_pop_8", |b| {
        b.iter(|| {
            for i in 0..8 {
                manager.push_queue(DeviceClass::Gpu, i % 2).unwrap();
            }
            black_box(manager.current_queue().unwrap());
            for _ in 0..8 {
                manager.pop_queue().unwrap();
            }
        });
    });

    group.bench_function("activate_guard", |b| {
        b.iter(|| {
            let guard = manager.activate(DeviceClass::Cpu, 0).unwrap();
            black_box(guard.queue().id());
        });
    });

    group.finish();
}

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_registry");
    let manager = make_manager();
    manager.get_queue(DeviceClass::Gpu, 1).unwrap();

    group.bench_function("cached_get", |b| {
        b.iter(|| black_box(manager.get_queue(DeviceClass::Gpu, 1).unwrap()));
    });

    group.bench_function("current_default", |b| {
        b.iter(|| black_box(manager.current_queue().unwrap()));
    });

    group.finish();
}

criterion_group!(benches, bench_push_pop, bench_registry);
criterion_main!(benches);
