//! Error types surfaced by cache construction and the shared backend.
//!
//! Recoverable conditions (oversize payloads, value-codec failures, header
//! mismatches) never reach these types; they degrade to cache bypasses or
//! reinitialization inside the stores. What is left is genuinely fatal:
//! invalid configuration at wrap time, and OS failures while attaching the
//! shared region.

use core::fmt;
use std::io;

// ─────────────────────────────────────────────────────────────────────────────
// ConfigError
// ─────────────────────────────────────────────────────────────────────────────

/// Rejected cache configuration. Raised at build time, before any store
/// state exists, so a failed build leaves nothing behind.
#[derive(Debug)]
pub enum ConfigError {
    /// `max_size` must hold at least one entry.
    ZeroMaxSize,
    /// `max_key_size` of zero would reject every key.
    ZeroMaxKeySize,
    /// `max_value_size` of zero would reject every value.
    ZeroMaxValueSize,
    /// Shared caches need a non-empty rendezvous name.
    EmptyCacheName,
    /// The shared cache name becomes a file name under the scratch
    /// directory and must not traverse out of it.
    InvalidCacheName(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroMaxSize => write!(f, "max_size must be greater than zero"),
            ConfigError::ZeroMaxKeySize => write!(f, "max_key_size must be greater than zero"),
            ConfigError::ZeroMaxValueSize => {
                write!(f, "max_value_size must be greater than zero")
            }
            ConfigError::EmptyCacheName => write!(f, "shared cache name must not be empty"),
            ConfigError::InvalidCacheName(name) => {
                write!(f, "shared cache name {name:?} is not a valid file name")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ─────────────────────────────────────────────────────────────────────────────
// SharedCacheError
// ─────────────────────────────────────────────────────────────────────────────

/// Failure to open or attach a shared cache region.
///
/// Per-operation problems after a successful attach never surface here;
/// they degrade to logged bypasses so one slow or broken call cannot poison
/// the store.
#[derive(Debug)]
pub enum SharedCacheError {
    /// Configuration rejected before touching the filesystem.
    Config(ConfigError),
    /// Creating, sizing, locking, or mapping the scratch files failed.
    Io(io::Error),
}

impl fmt::Display for SharedCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedCacheError::Config(e) => write!(f, "invalid shared cache config: {e}"),
            SharedCacheError::Io(e) => write!(f, "shared cache region I/O: {e}"),
        }
    }
}

impl std::error::Error for SharedCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SharedCacheError::Config(e) => Some(e),
            SharedCacheError::Io(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SharedCacheError {
    fn from(e: ConfigError) -> Self {
        SharedCacheError::Config(e)
    }
}

impl From<io::Error> for SharedCacheError {
    fn from(e: io::Error) -> Self {
        SharedCacheError::Io(e)
    }
}
