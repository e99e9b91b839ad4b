//! warp-cache: function memoization with a dual-backend store.
//!
//! Wraps user computations (sync or async) and returns cached results keyed
//! by call arguments, under one of four eviction strategies (LRU, MRU,
//! FIFO, LFU) with an optional TTL. Two backends:
//!
//! - [`MemoryStore`]: a thread-safe in-process cache holding values by
//!   ownership.
//! - [`SharedStore`]: a fixed-capacity open-addressed hash table in a
//!   mmap'd scratch file, serialized by an advisory file lock, shared by
//!   unrelated processes. Keys hash with fixed-seed xxh64, so every
//!   process finds every other process' entries.
//!
//! ```no_run
//! use warp_cache::{Args, ArgValue, CacheBuilder, Strategy};
//!
//! let add = CacheBuilder::new()
//!     .strategy(Strategy::Lru)
//!     .max_size(128)
//!     .build_memory(|args: &Args| match (&args.positional()[0], &args.positional()[1]) {
//!         (ArgValue::Int(a), ArgValue::Int(b)) => a + b,
//!         _ => 0,
//!     })
//!     .unwrap();
//!
//! assert_eq!(add.call(&Args::new().arg(1).arg(2)), 3); // computed
//! assert_eq!(add.call(&Args::new().arg(1).arg(2)), 3); // cached
//! assert_eq!(add.cache_info().hits, 1);
//! ```
//!
//! The shared backend's region files live under the OS temp dir (see
//! [`config::scratch_dir`]) and are scratch state: deleting them between
//! runs is always safe.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod key;
pub mod memory;
pub mod policy;
pub mod shared;
pub mod stats;
pub mod timefn;
pub mod value;
pub mod xxhash;

/// Builder for cached functions and bare stores; the usual entry point.
pub use dispatch::CacheBuilder;
/// Sync and async cached-function wrappers and the backend seam.
pub use dispatch::{AsyncCachedFunction, CachedFunction, Store};
/// Fatal error types (invalid configuration, region attach failures).
pub use error::{ConfigError, SharedCacheError};
/// Call-argument model and the canonical fingerprint.
pub use key::{ArgValue, Args, Fingerprint};
/// In-process backend.
pub use memory::MemoryStore;
/// Eviction strategies.
pub use policy::Strategy;
/// Shared-memory backend and its region configuration.
pub use shared::{SharedConfig, SharedStore};
/// Statistics snapshots.
pub use stats::{CacheInfo, SharedCacheInfo};
