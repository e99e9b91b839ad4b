//! Criterion benchmarks for both cache backends.
//!
//! Run with:
//!   cargo bench --bench store
//!
//! Covers the hot paths a memoization engine lives on: fingerprint
//! encoding, hit lookups per strategy, eviction churn, and the shared
//! backend's lock-and-probe hit path.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::TempDir;
use warp_cache::{Args, CacheBuilder, Fingerprint, SharedStore, Strategy};

fn bench_fingerprint(c: &mut Criterion) {
    let mut group = c.benchmark_group("fingerprint");

    let small = Args::new().arg(42).arg("short");
    group.bench_function("scalar_args", |b| {
        b.iter(|| Fingerprint::from_args(&small))
    });

    let nested = Args::new()
        .arg(vec![
            warp_cache::ArgValue::from(1),
            warp_cache::ArgValue::from("two"),
            warp_cache::ArgValue::from(3.0),
        ])
        .named("mode", "deep")
        .named("level", 9);
    group.bench_function("nested_args", |b| {
        b.iter(|| Fingerprint::from_args(&nested))
    });

    group.finish();
}

fn bench_memory_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_hit");
    group.throughput(Throughput::Elements(1));

    for strategy in Strategy::ALL {
        let store = CacheBuilder::new()
            .strategy(strategy)
            .max_size(1024)
            .memory_store::<i64>()
            .unwrap();
        // Warm 512 resident keys.
        for i in 0..512i64 {
            store.set(&Args::new().arg(i), &i);
        }
        let keys: Vec<Args> = (0..512i64).map(|i| Args::new().arg(i)).collect();

        group.bench_with_input(
            BenchmarkId::new("strategy", format!("{strategy:?}")),
            &keys,
            |b, keys| {
                let mut i = 0usize;
                b.iter(|| {
                    let v = store.get(&keys[i & 511]);
                    i = i.wrapping_add(1);
                    v
                })
            },
        );
    }
    group.finish();
}

fn bench_memory_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("memory_churn");
    group.throughput(Throughput::Elements(1));

    // Tiny cache, endless unique keys: every insert evicts.
    let store = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(64)
        .memory_store::<i64>()
        .unwrap();
    group.bench_function("insert_evict", |b| {
        let mut i = 0i64;
        b.iter(|| {
            store.set(&Args::new().arg(i), &i);
            i = i.wrapping_add(1);
        })
    });
    group.finish();
}

fn bench_shared_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("shared_hit");
    group.throughput(Throughput::Elements(1));

    let dir = TempDir::new().unwrap();
    let store: SharedStore<i64> = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(1024)
        .shared_store_in(dir.path(), "bench")
        .unwrap();
    for i in 0..512i64 {
        store.set(&Args::new().arg(i), &i);
    }
    let keys: Vec<Args> = (0..512i64).map(|i| Args::new().arg(i)).collect();

    group.bench_function("lock_probe_decode", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let v = store.get(&keys[i & 511]);
            i = i.wrapping_add(1);
            v
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_fingerprint,
    bench_memory_hits,
    bench_memory_churn,
    bench_shared_hits
);
criterion_main!(benches);
