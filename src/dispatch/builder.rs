//! Cache configuration builder.
//!
//! One builder serves both backends; the terminal method picks the backend
//! and the wrapper flavor. Invalid configuration fails at build time,
//! before any store state or region file exists.

use std::future::Future;
use std::path::Path;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{AsyncCachedFunction, CachedFunction};
use crate::config::{DEFAULT_MAX_KEY_SIZE, DEFAULT_MAX_SIZE, DEFAULT_MAX_VALUE_SIZE};
use crate::error::{ConfigError, SharedCacheError};
use crate::key::Args;
use crate::memory::MemoryStore;
use crate::policy::Strategy;
use crate::shared::{SharedConfig, SharedStore};
use crate::timefn::ttl_to_micros;

/// Builder for cached functions and bare stores.
///
/// Defaults: LRU, `max_size` 128, no TTL, and the shared-backend caps of
/// 512 key bytes / 4096 value bytes.
#[derive(Debug, Clone)]
pub struct CacheBuilder {
    strategy: Strategy,
    max_size: usize,
    ttl: Option<Duration>,
    max_key_size: usize,
    max_value_size: usize,
}

impl Default for CacheBuilder {
    fn default() -> Self {
        CacheBuilder {
            strategy: Strategy::Lru,
            max_size: DEFAULT_MAX_SIZE,
            ttl: None,
            max_key_size: DEFAULT_MAX_KEY_SIZE,
            max_value_size: DEFAULT_MAX_VALUE_SIZE,
        }
    }
}

impl CacheBuilder {
    pub fn new() -> Self {
        CacheBuilder::default()
    }

    /// Eviction strategy; default LRU.
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Maximum number of cached entries; must be positive.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    /// Entry time-to-live; entries older than this read as absent.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Cap on encoded key bytes (shared backend only).
    pub fn max_key_size(mut self, bytes: usize) -> Self {
        self.max_key_size = bytes;
        self
    }

    /// Cap on encoded value bytes (shared backend only).
    pub fn max_value_size(mut self, bytes: usize) -> Self {
        self.max_value_size = bytes;
        self
    }

    fn shared_config(&self) -> SharedConfig {
        SharedConfig {
            strategy: self.strategy,
            max_size: self.max_size,
            ttl_micros: ttl_to_micros(self.ttl),
            max_key_size: self.max_key_size,
            max_value_size: self.max_value_size,
        }
    }

    // ── Bare stores ──────────────────────────────────────────────────────────

    /// Build an in-process store without a wrapped function.
    pub fn memory_store<V: Clone>(&self) -> Result<MemoryStore<V>, ConfigError> {
        MemoryStore::new(self.strategy, self.max_size, self.ttl)
    }

    /// Build (attach or create) a named shared store without a wrapped
    /// function.
    pub fn shared_store<V>(&self, name: &str) -> Result<SharedStore<V>, SharedCacheError>
    where
        V: Serialize + DeserializeOwned,
    {
        SharedStore::open(name, self.shared_config())
    }

    /// Like [`CacheBuilder::shared_store`] with an explicit directory
    /// instead of the default scratch directory.
    pub fn shared_store_in<V>(
        &self,
        dir: &Path,
        name: &str,
    ) -> Result<SharedStore<V>, SharedCacheError>
    where
        V: Serialize + DeserializeOwned,
    {
        SharedStore::open_in(dir, name, self.shared_config())
    }

    // ── Wrapped functions ────────────────────────────────────────────────────

    /// Memoize a sync function in process.
    pub fn build_memory<F, V>(
        self,
        func: F,
    ) -> Result<CachedFunction<F, V, MemoryStore<V>>, ConfigError>
    where
        F: Fn(&Args) -> V,
        V: Clone,
    {
        Ok(CachedFunction::new(func, self.memory_store()?))
    }

    /// Memoize an async function in process.
    pub fn build_memory_async<F, Fut, V>(
        self,
        func: F,
    ) -> Result<AsyncCachedFunction<F, V, MemoryStore<V>>, ConfigError>
    where
        F: Fn(&Args) -> Fut,
        Fut: Future<Output = V>,
        V: Clone,
    {
        Ok(AsyncCachedFunction::new(func, self.memory_store()?))
    }

    /// Memoize a sync function in the named shared region.
    pub fn build_shared<F, V>(
        self,
        name: &str,
        func: F,
    ) -> Result<CachedFunction<F, V, SharedStore<V>>, SharedCacheError>
    where
        F: Fn(&Args) -> V,
        V: Serialize + DeserializeOwned,
    {
        Ok(CachedFunction::new(func, self.shared_store(name)?))
    }

    /// Memoize an async function in the named shared region.
    pub fn build_shared_async<F, Fut, V>(
        self,
        name: &str,
        func: F,
    ) -> Result<AsyncCachedFunction<F, V, SharedStore<V>>, SharedCacheError>
    where
        F: Fn(&Args) -> Fut,
        Fut: Future<Output = V>,
        V: Serialize + DeserializeOwned,
    {
        Ok(AsyncCachedFunction::new(func, self.shared_store(name)?))
    }
}
