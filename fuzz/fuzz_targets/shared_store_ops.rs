#![no_main]
use libfuzzer_sys::fuzz_target;
use tempfile::TempDir;
use warp_cache::{Args, CacheBuilder, SharedStore, Strategy};

// Arbitrary op sequences against a tiny shared region: whatever the input
// drives, the store must never panic, never exceed capacity, and always
// return the value most recently stored for a key.
fuzz_target!(|data: &[u8]| {
    let dir = match TempDir::new() {
        Ok(dir) => dir,
        Err(_) => return,
    };

    let strategy = Strategy::ALL[data.first().copied().unwrap_or(0) as usize % 4];
    let store: SharedStore<u64> = match CacheBuilder::new()
        .strategy(strategy)
        .max_size(4)
        .max_key_size(64)
        .max_value_size(64)
        .shared_store_in(dir.path(), "fuzz")
    {
        Ok(store) => store,
        Err(_) => return,
    };

    let mut completed_lookups = 0u64;
    for chunk in data.chunks(2).skip(1) {
        let op = chunk[0] % 4;
        let key = i64::from(chunk.get(1).copied().unwrap_or(0) % 16);
        let args = Args::new().arg(key);
        match op {
            0 => {
                store.set(&args, &(key as u64 * 3));
            }
            1 => {
                if let Some(v) = store.get(&args) {
                    assert_eq!(v, key as u64 * 3, "stored value corrupted for {key}");
                }
                completed_lookups += 1;
            }
            2 => store.clear(),
            _ => {
                let info = store.info();
                assert!(info.current_size <= 4);
            }
        }
    }

    let info = store.info();
    assert!(info.current_size <= 4);
    // Counters only grow via lookups and reset on clear, so they can never
    // exceed the lookups this process completed (it is the only client).
    assert!(info.hits + info.misses <= completed_lookups);
});
