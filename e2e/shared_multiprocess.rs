//! E2E: cross-process behavior of the shared-memory backend.
//!
//! Each parent test re-executes this test binary with `--ignored --exact
//! child_*` plus environment variables carrying the region directory and
//! parameters. The children are real unrelated processes: separate address
//! spaces, separate ASLR, separate allocator state. Entries still rendezvous
//! because fingerprint hashing is fixed-seed and the region layout is
//! deterministic.

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;
use warp_cache::{Args, CacheBuilder, CachedFunction, SharedStore, Strategy};

const CAPACITY: usize = 16;

fn open_store(dir: &Path, name: &str) -> SharedStore<i64> {
    CacheBuilder::new()
        .strategy(Strategy::Lru)
        .max_size(CAPACITY)
        .shared_store_in(dir, name)
        .unwrap()
}

fn square(args: &Args) -> i64 {
    let x = args.positional()[0].as_int().unwrap();
    x * x
}

/// Re-run this test binary to execute one `child_*` test in a fresh
/// process, passing parameters through the environment.
fn run_child(test_name: &str, envs: &[(&str, String)]) {
    let exe = env::current_exe().unwrap();
    let mut cmd = Command::new(exe);
    cmd.args([test_name, "--exact", "--ignored", "--test-threads", "1"]);
    for (k, v) in envs {
        cmd.env(k, v);
    }
    let status = cmd.status().unwrap();
    assert!(status.success(), "child {test_name} failed: {status}");
}

fn env_path(key: &str) -> PathBuf {
    PathBuf::from(env::var(key).unwrap())
}

fn env_i64(key: &str) -> i64 {
    env::var(key).unwrap().parse().unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// Child entry points (only run when spawned by the tests below)
// ─────────────────────────────────────────────────────────────────────────────

#[test]
#[ignore = "child process entry; spawned by the multiprocess tests"]
fn child_reader() {
    let dir = env_path("WARP_E2E_DIR");
    let store = open_store(&dir, &env::var("WARP_E2E_NAME").unwrap());
    let key = env_i64("WARP_E2E_KEY");
    let expect = env_i64("WARP_E2E_EXPECT");

    // The parent's entry must be visible here, as a hit.
    let hits_before = store.info().hits;
    assert_eq!(store.get(&Args::new().arg(key)), Some(expect));
    assert_eq!(store.info().hits, hits_before + 1);
}

#[test]
#[ignore = "child process entry; spawned by the multiprocess tests"]
fn child_writer() {
    let dir = env_path("WARP_E2E_DIR");
    let store = open_store(&dir, &env::var("WARP_E2E_NAME").unwrap());
    let cached = CachedFunction::new(square, store);
    let start = env_i64("WARP_E2E_START");
    let count = env_i64("WARP_E2E_COUNT");

    for i in start..start + count {
        assert_eq!(cached.call(&Args::new().arg(i)), i * i);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 1: an entry written by the parent is findable by a child process
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn cross_process_visibility() {
    let dir = TempDir::new().unwrap();
    let cached = CachedFunction::new(square, open_store(dir.path(), "vis"));

    assert_eq!(cached.call(&Args::new().arg(42)), 1764);
    let hits_before = cached.cache_info().hits;

    run_child(
        "child_reader",
        &[
            ("WARP_E2E_DIR", dir.path().display().to_string()),
            ("WARP_E2E_NAME", "vis".into()),
            ("WARP_E2E_KEY", "42".into()),
            ("WARP_E2E_EXPECT", "1764".into()),
        ],
    );

    // The child's hit landed in the shared header.
    assert_eq!(cached.cache_info().hits, hits_before + 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 2: concurrent writer processes fill the cache without corruption
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn concurrent_writers() {
    let dir = TempDir::new().unwrap();
    let dir_str = dir.path().display().to_string();

    let exe = env::current_exe().unwrap();
    let mut children = Vec::new();
    for w in 0..4i64 {
        let mut cmd = Command::new(&exe);
        cmd.args(["child_writer", "--exact", "--ignored", "--test-threads", "1"]);
        cmd.env("WARP_E2E_DIR", &dir_str);
        cmd.env("WARP_E2E_NAME", "writers");
        cmd.env("WARP_E2E_START", (w * 4).to_string());
        cmd.env("WARP_E2E_COUNT", "4");
        children.push(cmd.spawn().unwrap());
    }
    for mut child in children {
        let status = child.wait().unwrap();
        assert!(status.success(), "writer child failed: {status}");
    }

    // All 16 distinct keys fit exactly; every value must be correct.
    let store = open_store(dir.path(), "writers");
    assert_eq!(store.info().current_size, CAPACITY);
    for i in 0..16i64 {
        assert_eq!(store.get(&Args::new().arg(i)), Some(i * i), "key {i}");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Test 3: eviction stays bounded when another process overfills the cache
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn eviction_across_processes() {
    let dir = TempDir::new().unwrap();
    let cached = CachedFunction::new(square, open_store(dir.path(), "evict"));

    for i in 0..CAPACITY as i64 {
        cached.call(&Args::new().arg(i));
    }
    assert_eq!(cached.cache_info().current_size, CAPACITY);

    // A child writes 4 novel keys, forcing evictions from its side.
    run_child(
        "child_writer",
        &[
            ("WARP_E2E_DIR", dir.path().display().to_string()),
            ("WARP_E2E_NAME", "evict".into()),
            ("WARP_E2E_START", "100".into()),
            ("WARP_E2E_COUNT", "4".into()),
        ],
    );

    let info = cached.cache_info();
    assert_eq!(info.current_size, CAPACITY);
    // The child's inserts are resident; 4 old keys were evicted.
    for i in 100..104i64 {
        assert_eq!(cached.get(&Args::new().arg(i)), Some(i * i), "key {i}");
    }
}
