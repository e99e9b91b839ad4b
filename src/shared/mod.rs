//! Shared-memory cache backend.
//!
//! A fixed-capacity open-addressed hash table laid out in a mmap'd scratch
//! file, shared by unrelated processes:
//!
//! ```text
//! [ HEADER | SLOT_TABLE | ENTRY_ARENA ]
//! ```
//!
//! - `layout`: byte offsets, little-endian field codecs, and the region
//!   geometry computed from a cache configuration.
//! - `lock`: the advisory file lock serializing every region access.
//! - `region`: mmap attach/initialize lifecycle and typed field access.
//! - `store`: probing, eviction, TTL, and the public `SharedStore` API.
//!
//! The region is a scratch area, not a database: deleting the files between
//! runs is always safe, and any magic/version/configuration mismatch on
//! attach reinitializes the region in place.

pub mod layout;
pub mod lock;
pub mod region;
pub mod store;

pub use layout::{Geometry, SharedConfig};
pub use store::SharedStore;
