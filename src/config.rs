// config.rs - compile-time defaults and scratch-directory resolution.
//
// All sizing knobs live here so the builder, the stores, and the tests agree
// on one set of numbers. Runtime overrides go through `CacheBuilder`.

use std::path::PathBuf;

// Default maximum number of cached entries per function.
// Can be overridden per cache via `CacheBuilder::max_size`.
pub const DEFAULT_MAX_SIZE: usize = 128;

// Default cap on an encoded fingerprint, shared backend only.
// Keys longer than this bypass the cache (counted in `oversize_skips`).
pub const DEFAULT_MAX_KEY_SIZE: usize = 512;

// Default cap on an encoded value, shared backend only.
pub const DEFAULT_MAX_VALUE_SIZE: usize = 4096;

// Subdirectory of the OS temp dir holding every `<name>.data` / `<name>.lock`
// pair. The directory is created lazily on first attach and never removed by
// the cache itself.
pub const SCRATCH_DIR_NAME: &str = "warp_cache";

/// Directory where shared-memory cache files live.
///
/// Honors the platform temp-dir convention (`$TMPDIR` on Unix) so unrelated
/// processes that agree on a cache name resolve the same files.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(SCRATCH_DIR_NAME)
}
