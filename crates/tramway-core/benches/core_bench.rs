//! Criterion benchmarks for the fault model and the notification hub.
//!
//! Run with: cargo bench -p tramway-core --bench core_bench

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tramway_core::fault::{speed_severity, weight_severity};
use tramway_core::{CabinId, CableLine, Fault, FaultSource, LifecycleKind, NotificationHub};

fn bench_fault_classification(c: &mut Criterion) {
    let mut group = c.benchmark_group("fault_classification");

    group.bench_function("weight_severity", |b| {
        b.iter(|| black_box(weight_severity(black_box(7_075.0), black_box(7_000.0))));
    });

    group.bench_function("speed_severity", |b| {
        b.iter(|| black_box(speed_severity(black_box(4.5))));
    });

    let cable = CableLine::new(10_000.0).expect("valid cable");
    group.bench_function("cable_check_invariants", |b| {
        b.iter(|| black_box(cable.check_invariants()));
    });

    group.bench_function("weight_fault_message", |b| {
        b.iter(|| black_box(Fault::weight(black_box(7_150.0), 7_000.0)));
    });

    group.finish();
}

fn bench_hub_publish(c: &mut Criterion) {
    let mut group = c.benchmark_group("hub_publish");

    let hub = NotificationHub::new();
    let delivered = Arc::new(AtomicUsize::new(0));
    for _ in 0..4 {
        let delivered = delivered.clone();
        hub.subscribe_lifecycle(move |_| {
            delivered.fetch_add(1, Ordering::Relaxed);
        });
    }
    hub.subscribe_faults(|_| {});

    let cabin = CabinId(0);
    group.bench_function("lifecycle_to_4_handlers", |b| {
        b.iter(|| hub.publish_lifecycle(LifecycleKind::Moved, cabin, black_box(512.0)));
    });

    group.bench_function("fault_to_1_handler", |b| {
        b.iter(|| hub.publish_fault(Fault::weight(7_040.0, 7_000.0), FaultSource::Cabin(cabin)));
    });

    group.finish();
    black_box(delivered.load(Ordering::Relaxed));
}

criterion_group!(benches, bench_fault_classification, bench_hub_publish);
criterion_main!(benches);
