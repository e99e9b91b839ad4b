//! Key codec: call arguments, their canonical byte encoding, and the
//! fingerprint type the stores index by.
//!
//! Two calls are the same cache key iff they carry equal positional values
//! in the same positions and the same named-argument set with equal values.
//! The encoding is byte-stable across processes, so the shared backend can
//! compare fingerprints written by unrelated programs.

pub mod args;
pub mod encode;

pub use args::{ArgValue, Args};

use crate::xxhash::fingerprint_hash;
use std::hash::{Hash, Hasher};

/// Canonical byte encoding of a call's arguments plus its xxh64 hash.
///
/// Equality is byte-wise; the hash is derived from the bytes with a fixed
/// seed and is therefore identical in every process (property the shared
/// backend's slot table depends on).
#[derive(Debug, Clone)]
pub struct Fingerprint {
    bytes: Vec<u8>,
    hash: u64,
}

impl Fingerprint {
    /// Encode `args` and hash the result.
    pub fn from_args(args: &Args) -> Self {
        let bytes = encode::encode_args(args);
        let hash = fingerprint_hash(&bytes);
        Fingerprint { bytes, hash }
    }

    /// The canonical key bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Deterministic 64-bit hash of [`Fingerprint::bytes`].
    #[inline]
    pub fn hash64(&self) -> u64 {
        self.hash
    }

    /// Encoded length in bytes, compared against `max_key_size` by the
    /// shared backend.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl PartialEq for Fingerprint {
    fn eq(&self, other: &Self) -> bool {
        // Hash first: cheap reject for the common mismatch case.
        self.hash == other.hash && self.bytes == other.bytes
    }
}

impl Eq for Fingerprint {}

impl Hash for Fingerprint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // The xxh64 is already a high-quality mix of the full byte string;
        // feeding it to the table hasher avoids rehashing the key bytes.
        state.write_u64(self.hash);
    }
}
