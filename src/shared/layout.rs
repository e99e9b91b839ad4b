//! Byte layout of the shared region: header fields, slot table, entry
//! arena, and the geometry derived from a cache configuration.
//!
//! Covers:
//! - LE read/write helpers (`read_le32`, `write_le32`, `read_le64`,
//!   `write_le64`)
//! - Header field offsets and the magic/version constants
//! - Slot record layout and the EMPTY/OCCUPIED/TOMBSTONE state byte
//! - Entry cell metadata layout
//! - [`SharedConfig`] and [`Geometry`]
//!
//! Every multi-byte integer in the region is little-endian at a fixed
//! offset, so any process that agrees on MAGIC + VERSION reads the same
//! structure regardless of how it was built.

use crate::error::ConfigError;
use crate::policy::Strategy;

// ─────────────────────────────────────────────────────────────────────────────
// Magic and version
// ─────────────────────────────────────────────────────────────────────────────

/// First 8 bytes of every region file. A foreign or torn file fails this
/// check and is reinitialized rather than parsed.
pub const MAGIC: [u8; 8] = *b"WARPCACH";

/// Region format version. Bumped on any layout change; old regions then
/// reinitialize on attach.
pub const VERSION: u32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// LE field codecs
// ─────────────────────────────────────────────────────────────────────────────

/// Read a little-endian `u32` at `offset`. No alignment assumptions.
#[inline]
pub fn read_le32(src: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        src[offset],
        src[offset + 1],
        src[offset + 2],
        src[offset + 3],
    ])
}

/// Write a little-endian `u32` at `offset`.
#[inline]
pub fn write_le32(dst: &mut [u8], offset: usize, value: u32) {
    dst[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Read a little-endian `u64` at `offset`.
#[inline]
pub fn read_le64(src: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&src[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

/// Write a little-endian `u64` at `offset`.
#[inline]
pub fn write_le64(dst: &mut [u8], offset: usize, value: u64) {
    dst[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
}

// ─────────────────────────────────────────────────────────────────────────────
// Header layout
// ─────────────────────────────────────────────────────────────────────────────

pub const OFF_MAGIC: usize = 0; // [u8; 8]
pub const OFF_VERSION: usize = 8; // u32
pub const OFF_STRATEGY: usize = 12; // u32, Strategy id in the low byte
pub const OFF_CAPACITY: usize = 16; // u32
pub const OFF_SLOT_COUNT: usize = 20; // u32
pub const OFF_MAX_KEY_SIZE: usize = 24; // u32
pub const OFF_MAX_VALUE_SIZE: usize = 28; // u32
pub const OFF_TTL_MICROS: usize = 32; // u64, 0 = no TTL
pub const OFF_HITS: usize = 40; // u64
pub const OFF_MISSES: usize = 48; // u64
pub const OFF_OVERSIZE_SKIPS: usize = 56; // u64
pub const OFF_CURRENT_SIZE: usize = 64; // u32
pub const OFF_LIST_HEAD: usize = 68; // u32, order-list head (coldest)
pub const OFF_LIST_TAIL: usize = 72; // u32, order-list tail (hottest)
pub const OFF_FREE_HEAD: usize = 76; // u32, free-cell list head
pub const OFF_SEQ: usize = 80; // u64, insertion sequence counter

/// Header size, padded so the slot table starts 8-byte aligned.
pub const HEADER_SIZE: usize = 96;

// ─────────────────────────────────────────────────────────────────────────────
// Slot table layout
// ─────────────────────────────────────────────────────────────────────────────

/// One open-addressing bucket: {hash, cell index, state}.
pub const SLOT_SIZE: usize = 16;
pub const SLOT_HASH: usize = 0; // u64
pub const SLOT_CELL: usize = 8; // u32
pub const SLOT_STATE: usize = 12; // u8, then 3 pad bytes

/// Never used since the last initialization; terminates probe chains.
pub const SLOT_EMPTY: u8 = 0;
/// Holds a live entry.
pub const SLOT_OCCUPIED: u8 = 1;
/// Previously occupied; probe chains continue through it and inserts may
/// reuse it.
pub const SLOT_TOMBSTONE: u8 = 2;

// ─────────────────────────────────────────────────────────────────────────────
// Entry cell layout
// ─────────────────────────────────────────────────────────────────────────────

// Cell metadata, followed by `max_key_size` key bytes then
// `max_value_size` value bytes. Free cells thread the free list through
// CELL_NEXT.
pub const CELL_INSERTED_AT: usize = 0; // u64 monotonic micros
pub const CELL_LAST_ACCESS: usize = 8; // u64 monotonic micros
pub const CELL_FREQ: usize = 16; // u64 access count (LFU)
pub const CELL_SEQ: usize = 24; // u64 insertion sequence
pub const CELL_PREV: usize = 32; // u32 order-list link
pub const CELL_NEXT: usize = 36; // u32 order-list / free-list link
pub const CELL_SLOT: usize = 40; // u32 owning slot index
pub const CELL_KEY_LEN: usize = 44; // u32
pub const CELL_VAL_LEN: usize = 48; // u32

/// Metadata prefix size, padded to 8 so payload offsets stay aligned.
pub const CELL_META_SIZE: usize = 56;

// ─────────────────────────────────────────────────────────────────────────────
// SharedConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Per-cache configuration of a shared region. Stored in the header and
/// compared field-for-field on attach: a mismatch means "a different
/// cache" and reinitializes the region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedConfig {
    pub strategy: Strategy,
    /// Maximum number of live entries (the ENTRY_ARENA cell count).
    pub max_size: usize,
    /// TTL in microseconds; 0 disables expiry.
    pub ttl_micros: u64,
    /// Cap on encoded fingerprint bytes.
    pub max_key_size: usize,
    /// Cap on encoded value bytes.
    pub max_value_size: usize,
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::ZeroMaxSize);
        }
        if self.max_key_size == 0 {
            return Err(ConfigError::ZeroMaxKeySize);
        }
        if self.max_value_size == 0 {
            return Err(ConfigError::ZeroMaxValueSize);
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Geometry
// ─────────────────────────────────────────────────────────────────────────────

/// Region measurements derived from a [`SharedConfig`]. Deterministic:
/// every process attaching with the same configuration computes the same
/// file size and offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    pub capacity: u32,
    /// Power of two, at least `2 * capacity`, so linear probing can wrap
    /// with a mask and the load factor stays at or below 0.5.
    pub slot_count: u32,
    /// Bytes per entry cell (metadata + both payload areas, 8-aligned).
    pub cell_size: usize,
    /// Key payload area inside a cell; the value area follows it.
    pub key_area: usize,
    pub slots_off: usize,
    pub arena_off: usize,
    pub total_size: usize,
}

impl Geometry {
    pub fn for_config(cfg: &SharedConfig) -> Geometry {
        let capacity = cfg.max_size as u32;
        let slot_count = (cfg.max_size * 2).max(8).next_power_of_two() as u32;
        let cell_size = align8(CELL_META_SIZE + cfg.max_key_size + cfg.max_value_size);
        let slots_off = HEADER_SIZE;
        let arena_off = slots_off + slot_count as usize * SLOT_SIZE;
        Geometry {
            capacity,
            slot_count,
            cell_size,
            key_area: cfg.max_key_size,
            slots_off,
            arena_off,
            total_size: arena_off + cfg.max_size * cell_size,
        }
    }

    #[inline]
    pub fn slot_off(&self, slot: u32) -> usize {
        self.slots_off + slot as usize * SLOT_SIZE
    }

    #[inline]
    pub fn cell_off(&self, cell: u32) -> usize {
        self.arena_off + cell as usize * self.cell_size
    }

    /// Probe mask; valid because `slot_count` is a power of two.
    #[inline]
    pub fn mask(&self) -> u64 {
        (self.slot_count - 1) as u64
    }
}

#[inline]
fn align8(n: usize) -> usize {
    (n + 7) & !7
}
