//! In-process cache backend.
//!
//! A slab of entries indexed by a fingerprint map, with the eviction
//! policy's order list threaded through the entries. Map and policy state
//! are one invariant and live behind one lock; see `store` for the
//! concurrency discipline.

pub mod store;

pub use store::MemoryStore;
