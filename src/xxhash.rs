//! Thin wrapper around the `xxhash-rust` crate providing the XXH64 API used
//! for fingerprint hashing.
//!
//! The hash seed is a compile-time constant: the same key bytes must map to
//! the same 64-bit hash in every process, or cross-process lookups in the
//! shared backend would never find each other's entries. The std
//! `DefaultHasher` is randomized per process and must not be used here.

/// Seed for every fingerprint hash. Fixed so hashes are stable across
/// processes, runs, and hosts.
pub const FINGERPRINT_SEED: u64 = 0;

/// One-shot XXH64 hash.
#[inline]
pub fn xxh64_oneshot(data: &[u8], seed: u64) -> u64 {
    xxhash_rust::xxh64::xxh64(data, seed)
}

/// Hash of an encoded fingerprint, using [`FINGERPRINT_SEED`].
#[inline]
pub fn fingerprint_hash(data: &[u8]) -> u64 {
    xxh64_oneshot(data, FINGERPRINT_SEED)
}
