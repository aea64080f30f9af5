//! HOT PATH PERFORMANCE BENCHMARKS
//!
//! The begin/end handlers model a probe-runtime execution context with
//! a strict per-invocation budget, so their host-side cost is the
//! number that matters.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use latmon_lib::aggregate::{latency_slot, AggregationSession, HistogramStore};
use latmon_lib::core::{EngineConfig, HistKey, ManualClock, MonotonicClock};
use std::sync::Arc;

fn bench_bucketizer(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucketizer");

    group.bench_function("latency_slot", |b| {
        let mut d = 1u64;
        b.iter(|| {
            d = d.wrapping_mul(6364136223846793005).wrapping_add(1);
            black_box(latency_slot(black_box(d >> 32), 27));
        });
    });

    group.finish();
}

fn bench_begin_end_pair(c: &mut Criterion) {
    let mut group = c.benchmark_group("session");

    let clock = Arc::new(ManualClock::new(0));
    let session: AggregationSession<u64, u32> = AggregationSession::new(
        &EngineConfig::default(),
        Arc::clone(&clock) as Arc<dyn MonotonicClock>,
    );

    group.bench_function("begin_end_pair", |b| {
        let mut key = 0u64;
        b.iter(|| {
            key = key.wrapping_add(1);
            session.on_begin(black_box(key));
            clock.advance(5_000);
            session.on_end(black_box(key), 7);
        });
    });

    group.bench_function("unmatched_end", |b| {
        b.iter(|| {
            session.on_end(black_box(u64::MAX), 7);
        });
    });

    group.finish();
}

fn bench_contended_increment(c: &mut Criterion) {
    let mut group = c.benchmark_group("histogram");

    let store: HistogramStore<u32> = HistogramStore::new(1024);
    let key = HistKey::new(7u32, 3);
    store.increment(key, 1);

    group.bench_function("increment_existing_key", |b| {
        b.iter(|| {
            store.increment(black_box(key), 1);
        });
    });

    group.bench_function("snapshot_1k_keys", |b| {
        let store: HistogramStore<u32> = HistogramStore::new(2048);
        for dims in 0..36u32 {
            for slot in 0..28u16 {
                store.increment(HistKey::new(dims, slot), 1);
            }
        }
        b.iter(|| {
            black_box(store.snapshot_all());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_bucketizer,
    bench_begin_end_pair,
    bench_contended_increment
);
criterion_main!(benches);
