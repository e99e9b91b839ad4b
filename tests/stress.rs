//! Stress scenarios pushing the in-process backend harder than the basic
//! suite: volume, churn, contention, TTL under load, and mixed workloads.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use warp_cache::{Args, CacheBuilder, Strategy};

fn int(args: &Args, i: usize) -> i64 {
    args.positional()[i].as_int().unwrap()
}

/// Cheap deterministic PRNG so threads get distinct but reproducible key
/// streams (splitmix64 step).
fn next_rand(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

// ─────────────────────────────────────────────────────────────────────────────
// 1. High volume: 100k ops per strategy over 2000 distinct keys
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn high_volume_every_strategy() {
    for strategy in Strategy::ALL {
        let f = CacheBuilder::new()
            .strategy(strategy)
            .max_size(1024)
            .build_memory(|args: &Args| int(args, 0) * 3 + 1)
            .unwrap();

        for i in 0..100_000i64 {
            let key = i % 2000;
            assert_eq!(f.call(&Args::new().arg(key)), key * 3 + 1);
        }

        let info = f.cache_info();
        assert_eq!(info.hits + info.misses, 100_000, "{strategy:?}");
        assert!(info.current_size <= 1024, "{strategy:?}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 2. Eviction churn: tiny cache, all-unique keys
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn eviction_churn_every_strategy() {
    for strategy in Strategy::ALL {
        let f = CacheBuilder::new()
            .strategy(strategy)
            .max_size(10)
            .build_memory(|args: &Args| int(args, 0))
            .unwrap();

        for i in 0..10_000i64 {
            assert_eq!(f.call(&Args::new().arg(i)), i);
            assert!(f.cache_info().current_size <= 10, "{strategy:?}");
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 3. Heavy contention: 16 threads x 10k calls, 128-key workload, N=64
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn heavy_contention_accounting_is_exact() {
    let f = Arc::new(
        CacheBuilder::new()
            .strategy(Strategy::Lru)
            .max_size(64)
            .build_memory(|args: &Args| {
                let x = int(args, 0);
                x * x
            })
            .unwrap(),
    );

    const THREADS: usize = 16;
    const OPS: usize = 10_000;

    let mut handles = Vec::new();
    for t in 0..THREADS {
        let f = Arc::clone(&f);
        handles.push(thread::spawn(move || {
            let mut rng = 0xC0FFEE ^ t as u64;
            for _ in 0..OPS {
                let key = (next_rand(&mut rng) % 128) as i64;
                assert_eq!(f.call(&Args::new().arg(key)), key * key);
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let info = f.cache_info();
    // Every lookup is either a hit or a miss, no drops under contention.
    assert_eq!(info.hits + info.misses, (THREADS * OPS) as u64);
    assert!(info.current_size <= 64);
    assert!(info.hits > 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// 4. TTL under load
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn ttl_under_load() {
    let calls = Arc::new(AtomicU64::new(0));
    let calls_in_fn = Arc::clone(&calls);
    let f = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(256)
        .ttl(Duration::from_millis(50))
        .build_memory(move |args: &Args| {
            calls_in_fn.fetch_add(1, Ordering::Relaxed);
            int(args, 0)
        })
        .unwrap();

    for i in 0..200i64 {
        assert_eq!(f.call(&Args::new().arg(i)), i);
    }
    let first_pass = calls.load(Ordering::Relaxed);

    thread::sleep(Duration::from_millis(100));

    // Everything expired: each key recomputes once more.
    for i in 0..200i64 {
        assert_eq!(f.call(&Args::new().arg(i)), i);
    }
    assert!(calls.load(Ordering::Relaxed) >= first_pass + 200);
}

// ─────────────────────────────────────────────────────────────────────────────
// 5. Mixed workload: lookups, info, and clears from many threads
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn mixed_workload_stays_consistent() {
    let f = Arc::new(
        CacheBuilder::new()
            .strategy(Strategy::Lfu)
            .max_size(128)
            .build_memory(|args: &Args| int(args, 0) + 1)
            .unwrap(),
    );

    let mut handles = Vec::new();
    for t in 0..8usize {
        let f = Arc::clone(&f);
        handles.push(thread::spawn(move || {
            let mut rng = 0xDECAF ^ t as u64;
            for _ in 0..5_000 {
                match next_rand(&mut rng) % 100 {
                    0..=59 => {
                        let key = (next_rand(&mut rng) % 256) as i64;
                        assert_eq!(f.call(&Args::new().arg(key)), key + 1);
                    }
                    60..=84 => {
                        let info = f.cache_info();
                        assert_eq!(info.max_size, 128);
                        assert!(info.current_size <= 128);
                    }
                    _ => f.cache_clear(),
                }
            }
        }));
    }
    for h in handles {
        h.join().unwrap();
    }
}
