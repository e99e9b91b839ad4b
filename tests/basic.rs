//! Basic hit/miss, clear, and keying behavior of the in-process backend.

use std::sync::atomic::{AtomicU64, Ordering};

use warp_cache::{Args, CacheBuilder, Strategy};

fn int(args: &Args, i: usize) -> i64 {
    args.positional()[i].as_int().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: hit/miss accounting over a two-argument function
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn basic_hit_miss() {
    let calls = AtomicU64::new(0);
    let add = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(128)
        .build_memory(|args: &Args| {
            calls.fetch_add(1, Ordering::Relaxed);
            int(args, 0) + int(args, 1)
        })
        .unwrap();

    assert_eq!(add.call(&Args::new().arg(1).arg(2)), 3);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(add.call(&Args::new().arg(1).arg(2)), 3); // hit
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(add.call(&Args::new().arg(2).arg(3)), 5); // miss
    assert_eq!(calls.load(Ordering::Relaxed), 2);

    let info = add.cache_info();
    assert_eq!(info.hits, 1);
    assert_eq!(info.misses, 2);
    assert_eq!(info.current_size, 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: clear resets statistics and contents
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cache_clear() {
    let square = CacheBuilder::new()
        .max_size(128)
        .build_memory(|args: &Args| int(args, 0) * int(args, 0))
        .unwrap();

    assert_eq!(square.call(&Args::new().arg(3)), 9);
    assert_eq!(square.call(&Args::new().arg(3)), 9);
    assert_eq!(square.cache_info().hits, 1);

    square.cache_clear();
    let info = square.cache_info();
    assert_eq!(info.hits, 0);
    assert_eq!(info.misses, 0);
    assert_eq!(info.current_size, 0);

    assert_eq!(square.call(&Args::new().arg(3)), 9);
    assert_eq!(square.cache_info().misses, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: a cached `None` value is a hit, not a miss
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn none_return_value_is_cached() {
    let calls = AtomicU64::new(0);
    let lookup = CacheBuilder::new()
        .max_size(128)
        .build_memory(|_args: &Args| -> Option<String> {
            calls.fetch_add(1, Ordering::Relaxed);
            None
        })
        .unwrap();

    assert_eq!(lookup.call(&Args::new().arg(1)), None);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    // The inner None came from the cache this time.
    assert_eq!(lookup.call(&Args::new().arg(1)), None);
    assert_eq!(calls.load(Ordering::Relaxed), 1);
    assert_eq!(lookup.cache_info().hits, 1);
    // `get` distinguishes the cached None from a genuine miss by nesting.
    assert_eq!(lookup.get(&Args::new().arg(1)), Some(None));
    assert_eq!(lookup.get(&Args::new().arg(2)), None);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 4: named arguments key by name, not insertion order
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn named_arguments() {
    let calls = AtomicU64::new(0);
    let greet = CacheBuilder::new()
        .max_size(128)
        .build_memory(|args: &Args| {
            calls.fetch_add(1, Ordering::Relaxed);
            format!(
                "{} {}",
                args.named_args()["greeting"].as_str().unwrap(),
                args.positional()[0].as_str().unwrap()
            )
        })
        .unwrap();

    let hi = Args::new().arg("alice").named("greeting", "hi");
    assert_eq!(greet.call(&hi), "hi alice");
    assert_eq!(greet.call(&hi), "hi alice");
    assert_eq!(calls.load(Ordering::Relaxed), 1);

    let hey = Args::new().arg("alice").named("greeting", "hey");
    assert_eq!(greet.call(&hey), "hey alice");
    assert_eq!(calls.load(Ordering::Relaxed), 2);
}

#[test]
fn named_argument_order_is_irrelevant() {
    let add = CacheBuilder::new()
        .max_size(128)
        .build_memory(|args: &Args| {
            args.named_args()["a"].as_int().unwrap() + args.named_args()["b"].as_int().unwrap()
        })
        .unwrap();

    assert_eq!(add.call(&Args::new().named("a", 1).named("b", 2)), 3);
    assert_eq!(add.call(&Args::new().named("b", 2).named("a", 1)), 3);
    assert_eq!(add.cache_info().hits, 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 5: capacity eviction and the miss accounting around it
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn eviction_at_capacity() {
    let identity = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(3)
        .build_memory(|args: &Args| int(args, 0))
        .unwrap();

    for i in 1..=3 {
        identity.call(&Args::new().arg(i));
    }
    assert_eq!(identity.cache_info().current_size, 3);

    // A fourth key evicts the oldest (1).
    identity.call(&Args::new().arg(4));
    assert_eq!(identity.cache_info().current_size, 3);

    identity.call(&Args::new().arg(1));
    // 1, 2, 3, 4 were misses, then 1 again.
    assert_eq!(identity.cache_info().misses, 5);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 6: capacity + LRU read pattern (read 1, insert 4, then probe 1/3/2)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn lru_touch_then_probe() {
    let identity = CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(3)
        .build_memory(|args: &Args| int(args, 0))
        .unwrap();

    for i in 1..=3 {
        identity.call(&Args::new().arg(i));
    }
    identity.call(&Args::new().arg(1)); // touch 1; 2 becomes LRU
    identity.call(&Args::new().arg(4)); // evicts 2

    let misses_before = identity.cache_info().misses;
    assert_eq!(identity.get(&Args::new().arg(1)), Some(1)); // hit
    assert_eq!(identity.get(&Args::new().arg(3)), Some(3)); // hit
    assert_eq!(identity.get(&Args::new().arg(2)), None); // miss
    assert_eq!(identity.cache_info().misses, misses_before + 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 7: distinguishable argument shapes never share an entry
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn distinct_shapes_get_distinct_entries() {
    let count = AtomicU64::new(0);
    let probe = CacheBuilder::new()
        .max_size(128)
        .build_memory(|_args: &Args| count.fetch_add(1, Ordering::Relaxed))
        .unwrap();

    probe.call(&Args::new().arg(1));
    probe.call(&Args::new().arg(1.0));
    probe.call(&Args::new().arg("1"));
    probe.call(&Args::new().arg(b"1".as_slice()));
    probe.call(&Args::new().arg(true));
    probe.call(&Args::new().arg(()));
    assert_eq!(probe.cache_info().current_size, 6);
    assert_eq!(probe.cache_info().misses, 6);
}
