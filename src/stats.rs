//! Cache statistics snapshots.
//!
//! `hits`, `misses` and `oversize_skips` are monotonic between `clear`s;
//! `current_size` is a live reading. A snapshot is taken atomically with
//! respect to the store's own lock discipline, so `hits + misses` always
//! equals the number of completed lookups at the instant of the snapshot.

use core::fmt;

/// Statistics of an in-process cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub current_size: usize,
    pub max_size: usize,
}

impl fmt::Display for CacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CacheInfo(hits={}, misses={}, current_size={}, max_size={})",
            self.hits, self.misses, self.current_size, self.max_size
        )
    }
}

/// Statistics of a shared-memory cache. Extends [`CacheInfo`] with the
/// count of calls that bypassed the cache because their encoded key or
/// value exceeded the configured caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedCacheInfo {
    pub hits: u64,
    pub misses: u64,
    pub oversize_skips: u64,
    pub current_size: usize,
    pub max_size: usize,
}

impl fmt::Display for SharedCacheInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SharedCacheInfo(hits={}, misses={}, oversize_skips={}, current_size={}, max_size={})",
            self.hits, self.misses, self.oversize_skips, self.current_size, self.max_size
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_every_counter() {
        let info = CacheInfo {
            hits: 1,
            misses: 2,
            current_size: 2,
            max_size: 128,
        };
        let s = info.to_string();
        assert!(s.contains("hits=1"));
        assert!(s.contains("misses=2"));
        assert!(s.contains("max_size=128"));
    }

    #[test]
    fn shared_display_includes_skips() {
        let info = SharedCacheInfo {
            hits: 0,
            misses: 1,
            oversize_skips: 3,
            current_size: 0,
            max_size: 64,
        };
        let s = info.to_string();
        assert!(s.starts_with("SharedCacheInfo("));
        assert!(s.contains("oversize_skips=3"));
    }
}
