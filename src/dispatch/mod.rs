//! Call-site dispatch: route an invocation through key derivation, lookup,
//! compute-on-miss, and store.
//!
//! The [`Store`] trait is the seam between the wrappers and the two
//! backends. Both wrappers follow the same shape:
//!
//! 1. Derive the fingerprint from the call arguments.
//! 2. `get`: on a hit, return the cached value.
//! 3. On a miss, run the user's function.
//! 4. `set` the result, then return it.
//!
//! Lookup and store are separate critical sections. On the async path the
//! user's future is awaited between them with no store lock held, so two
//! concurrent callers of the same missing key may both compute; the second
//! `set` overwrites the first with an equal value. Deduplicating that
//! double-flight is deliberately out of scope.

pub mod builder;
pub mod cached;
pub mod future;

pub use builder::CacheBuilder;
pub use cached::CachedFunction;
pub use future::AsyncCachedFunction;

use crate::key::Args;
use crate::memory::MemoryStore;
use crate::shared::SharedStore;
use crate::stats::{CacheInfo, SharedCacheInfo};

/// Backend seam used by the cached-function wrappers.
///
/// `get` counts a hit or a miss and refreshes eviction metadata; `set`
/// inserts or overwrites, evicting if needed. Neither ever runs caller
/// code while holding a store lock.
pub trait Store<V> {
    /// Snapshot type returned by [`Store::info`].
    type Info;

    fn get(&self, args: &Args) -> Option<V>;
    fn set(&self, args: &Args, value: &V);
    fn clear(&self);
    fn info(&self) -> Self::Info;
}

impl<V: Clone> Store<V> for MemoryStore<V> {
    type Info = CacheInfo;

    fn get(&self, args: &Args) -> Option<V> {
        MemoryStore::get(self, args)
    }
    fn set(&self, args: &Args, value: &V) {
        MemoryStore::set(self, args, value)
    }
    fn clear(&self) {
        MemoryStore::clear(self)
    }
    fn info(&self) -> Self::Info {
        MemoryStore::info(self)
    }
}

impl<V> Store<V> for SharedStore<V>
where
    V: serde::Serialize + serde::de::DeserializeOwned,
{
    type Info = SharedCacheInfo;

    fn get(&self, args: &Args) -> Option<V> {
        SharedStore::get(self, args)
    }
    fn set(&self, args: &Args, value: &V) {
        SharedStore::set(self, args, value)
    }
    fn clear(&self) {
        SharedStore::clear(self)
    }
    fn info(&self) -> Self::Info {
        SharedStore::info(self)
    }
}
