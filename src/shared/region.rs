//! Mapped-region lifecycle and typed access to header, slot, and cell
//! fields.
//!
//! Attach flow (caller holds the region lock):
//! 1. Open or create `<name>.data` and size it to the configured geometry.
//! 2. Map it writable and shared.
//! 3. Compare the header against the expected magic, version, and
//!    configuration; any mismatch reinitializes the region in place. A
//!    mismatch is not an error: the previous contents were a different
//!    cache (or garbage) and this region is a scratch area.
//!
//! All accessors are plain byte reads/writes through the layout offsets;
//! nothing here takes the lock, so every caller must.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;

use log::debug;
use memmap2::MmapMut;

use crate::policy::NIL;
use crate::shared::layout::{
    self, Geometry, SharedConfig, CELL_FREQ, CELL_INSERTED_AT, CELL_KEY_LEN, CELL_LAST_ACCESS,
    CELL_META_SIZE, CELL_NEXT, CELL_PREV, CELL_SEQ, CELL_SLOT, CELL_VAL_LEN, HEADER_SIZE, MAGIC,
    OFF_CAPACITY, OFF_CURRENT_SIZE, OFF_FREE_HEAD, OFF_HITS, OFF_LIST_HEAD, OFF_LIST_TAIL,
    OFF_MAGIC, OFF_MAX_KEY_SIZE, OFF_MAX_VALUE_SIZE, OFF_MISSES, OFF_OVERSIZE_SKIPS, OFF_SEQ,
    OFF_SLOT_COUNT, OFF_STRATEGY, OFF_TTL_MICROS, OFF_VERSION, SLOT_CELL, SLOT_HASH, SLOT_STATE,
    VERSION,
};

/// A process' view of one shared cache file.
pub struct Region {
    map: MmapMut,
}

impl Region {
    /// Open, size, and map the data file, reinitializing its contents if
    /// the header does not describe this exact cache. Caller holds the
    /// region lock.
    pub fn attach(data_path: &Path, cfg: &SharedConfig, geom: &Geometry) -> io::Result<Region> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(data_path)?;
        if file.metadata()?.len() != geom.total_size as u64 {
            file.set_len(geom.total_size as u64)?;
        }

        // SAFETY: the mapping is private to this cache's files, every
        // access (ours and other processes') is serialized by the region
        // lock, and the file stays as large as the mapping for the life of
        // the region.
        let map = unsafe { MmapMut::map_mut(&file)? };
        let mut region = Region { map };

        if !region.header_matches(cfg, geom) {
            debug!(
                "reinitializing shared cache region {} (new, stale, or differently configured)",
                data_path.display()
            );
            region.initialize(cfg, geom);
        }
        Ok(region)
    }

    /// Whether the mapped header describes exactly this configuration.
    fn header_matches(&self, cfg: &SharedConfig, geom: &Geometry) -> bool {
        self.map[OFF_MAGIC..OFF_MAGIC + 8] == MAGIC
            && self.read_u32(OFF_VERSION) == VERSION
            && self.read_u32(OFF_STRATEGY) == cfg.strategy.id() as u32
            && self.read_u32(OFF_CAPACITY) == geom.capacity
            && self.read_u32(OFF_SLOT_COUNT) == geom.slot_count
            && self.read_u32(OFF_MAX_KEY_SIZE) == cfg.max_key_size as u32
            && self.read_u32(OFF_MAX_VALUE_SIZE) == cfg.max_value_size as u32
            && self.read_u64(OFF_TTL_MICROS) == cfg.ttl_micros
    }

    /// Write a pristine header, empty every slot, and rebuild the free-cell
    /// list. Also the implementation of `clear` (counters drop to zero).
    /// Stale arena payload bytes are left behind; nothing references them.
    pub fn initialize(&mut self, cfg: &SharedConfig, geom: &Geometry) {
        self.map[OFF_MAGIC..OFF_MAGIC + 8].copy_from_slice(&MAGIC);
        self.write_u32(OFF_VERSION, VERSION);
        self.write_u32(OFF_STRATEGY, cfg.strategy.id() as u32);
        self.write_u32(OFF_CAPACITY, geom.capacity);
        self.write_u32(OFF_SLOT_COUNT, geom.slot_count);
        self.write_u32(OFF_MAX_KEY_SIZE, cfg.max_key_size as u32);
        self.write_u32(OFF_MAX_VALUE_SIZE, cfg.max_value_size as u32);
        self.write_u64(OFF_TTL_MICROS, cfg.ttl_micros);
        self.write_u64(OFF_HITS, 0);
        self.write_u64(OFF_MISSES, 0);
        self.write_u64(OFF_OVERSIZE_SKIPS, 0);
        self.write_u32(OFF_CURRENT_SIZE, 0);
        self.write_u32(OFF_LIST_HEAD, NIL);
        self.write_u32(OFF_LIST_TAIL, NIL);
        self.write_u64(OFF_SEQ, 0);

        // Every slot back to EMPTY.
        self.map[geom.slots_off..geom.arena_off].fill(0);

        // Free list: all cells chained through CELL_NEXT.
        for cell in 0..geom.capacity {
            let next = if cell + 1 < geom.capacity { cell + 1 } else { NIL };
            self.set_cell_next(geom, cell, next);
            self.set_cell_prev(geom, cell, NIL);
        }
        self.write_u32(OFF_FREE_HEAD, if geom.capacity > 0 { 0 } else { NIL });
    }

    // ── Raw field codecs ─────────────────────────────────────────────────────

    #[inline]
    pub(crate) fn read_u32(&self, off: usize) -> u32 {
        layout::read_le32(&self.map, off)
    }

    #[inline]
    pub(crate) fn write_u32(&mut self, off: usize, v: u32) {
        layout::write_le32(&mut self.map, off, v);
    }

    #[inline]
    pub(crate) fn read_u64(&self, off: usize) -> u64 {
        layout::read_le64(&self.map, off)
    }

    #[inline]
    pub(crate) fn write_u64(&mut self, off: usize, v: u64) {
        layout::write_le64(&mut self.map, off, v);
    }

    // ── Header counters ──────────────────────────────────────────────────────

    pub fn hits(&self) -> u64 {
        self.read_u64(OFF_HITS)
    }

    pub fn misses(&self) -> u64 {
        self.read_u64(OFF_MISSES)
    }

    pub fn oversize_skips(&self) -> u64 {
        self.read_u64(OFF_OVERSIZE_SKIPS)
    }

    pub fn current_size(&self) -> u32 {
        self.read_u32(OFF_CURRENT_SIZE)
    }

    pub fn bump_hits(&mut self) {
        let v = self.hits() + 1;
        self.write_u64(OFF_HITS, v);
    }

    pub fn bump_misses(&mut self) {
        let v = self.misses() + 1;
        self.write_u64(OFF_MISSES, v);
    }

    pub fn bump_oversize_skips(&mut self) {
        let v = self.oversize_skips() + 1;
        self.write_u64(OFF_OVERSIZE_SKIPS, v);
    }

    pub fn set_current_size(&mut self, v: u32) {
        self.write_u32(OFF_CURRENT_SIZE, v);
    }

    /// Post-incremented insertion sequence counter.
    pub fn next_seq(&mut self) -> u64 {
        let seq = self.read_u64(OFF_SEQ);
        self.write_u64(OFF_SEQ, seq + 1);
        seq
    }

    // ── Policy list heads ────────────────────────────────────────────────────

    pub fn list_head(&self) -> u32 {
        self.read_u32(OFF_LIST_HEAD)
    }

    pub fn set_list_head(&mut self, v: u32) {
        self.write_u32(OFF_LIST_HEAD, v);
    }

    pub fn list_tail(&self) -> u32 {
        self.read_u32(OFF_LIST_TAIL)
    }

    pub fn set_list_tail(&mut self, v: u32) {
        self.write_u32(OFF_LIST_TAIL, v);
    }

    pub fn free_head(&self) -> u32 {
        self.read_u32(OFF_FREE_HEAD)
    }

    pub fn set_free_head(&mut self, v: u32) {
        self.write_u32(OFF_FREE_HEAD, v);
    }

    // ── Slot accessors ───────────────────────────────────────────────────────

    pub fn slot_state(&self, g: &Geometry, slot: u32) -> u8 {
        self.map[g.slot_off(slot) + SLOT_STATE]
    }

    pub fn set_slot_state(&mut self, g: &Geometry, slot: u32, state: u8) {
        self.map[g.slot_off(slot) + SLOT_STATE] = state;
    }

    pub fn slot_hash(&self, g: &Geometry, slot: u32) -> u64 {
        self.read_u64(g.slot_off(slot) + SLOT_HASH)
    }

    pub fn set_slot_hash(&mut self, g: &Geometry, slot: u32, hash: u64) {
        self.write_u64(g.slot_off(slot) + SLOT_HASH, hash);
    }

    pub fn slot_cell(&self, g: &Geometry, slot: u32) -> u32 {
        self.read_u32(g.slot_off(slot) + SLOT_CELL)
    }

    pub fn set_slot_cell(&mut self, g: &Geometry, slot: u32, cell: u32) {
        self.write_u32(g.slot_off(slot) + SLOT_CELL, cell);
    }

    // ── Cell metadata accessors ──────────────────────────────────────────────

    pub fn cell_inserted_at(&self, g: &Geometry, cell: u32) -> u64 {
        self.read_u64(g.cell_off(cell) + CELL_INSERTED_AT)
    }

    pub fn set_cell_inserted_at(&mut self, g: &Geometry, cell: u32, v: u64) {
        self.write_u64(g.cell_off(cell) + CELL_INSERTED_AT, v);
    }

    pub fn set_cell_last_access(&mut self, g: &Geometry, cell: u32, v: u64) {
        self.write_u64(g.cell_off(cell) + CELL_LAST_ACCESS, v);
    }

    pub fn cell_freq(&self, g: &Geometry, cell: u32) -> u64 {
        self.read_u64(g.cell_off(cell) + CELL_FREQ)
    }

    pub fn set_cell_freq(&mut self, g: &Geometry, cell: u32, v: u64) {
        self.write_u64(g.cell_off(cell) + CELL_FREQ, v);
    }

    pub fn cell_seq(&self, g: &Geometry, cell: u32) -> u64 {
        self.read_u64(g.cell_off(cell) + CELL_SEQ)
    }

    pub fn set_cell_seq(&mut self, g: &Geometry, cell: u32, v: u64) {
        self.write_u64(g.cell_off(cell) + CELL_SEQ, v);
    }

    pub fn cell_prev(&self, g: &Geometry, cell: u32) -> u32 {
        self.read_u32(g.cell_off(cell) + CELL_PREV)
    }

    pub fn set_cell_prev(&mut self, g: &Geometry, cell: u32, v: u32) {
        self.write_u32(g.cell_off(cell) + CELL_PREV, v);
    }

    pub fn cell_next(&self, g: &Geometry, cell: u32) -> u32 {
        self.read_u32(g.cell_off(cell) + CELL_NEXT)
    }

    pub fn set_cell_next(&mut self, g: &Geometry, cell: u32, v: u32) {
        self.write_u32(g.cell_off(cell) + CELL_NEXT, v);
    }

    pub fn cell_slot(&self, g: &Geometry, cell: u32) -> u32 {
        self.read_u32(g.cell_off(cell) + CELL_SLOT)
    }

    pub fn set_cell_slot(&mut self, g: &Geometry, cell: u32, v: u32) {
        self.write_u32(g.cell_off(cell) + CELL_SLOT, v);
    }

    // ── Cell payload accessors ───────────────────────────────────────────────

    pub fn cell_key(&self, g: &Geometry, cell: u32) -> &[u8] {
        let len = self.read_u32(g.cell_off(cell) + CELL_KEY_LEN) as usize;
        let off = g.cell_off(cell) + CELL_META_SIZE;
        &self.map[off..off + len]
    }

    pub fn set_cell_key(&mut self, g: &Geometry, cell: u32, key: &[u8]) {
        self.write_u32(g.cell_off(cell) + CELL_KEY_LEN, key.len() as u32);
        let off = g.cell_off(cell) + CELL_META_SIZE;
        self.map[off..off + key.len()].copy_from_slice(key);
    }

    pub fn cell_value(&self, g: &Geometry, cell: u32) -> &[u8] {
        let len = self.read_u32(g.cell_off(cell) + CELL_VAL_LEN) as usize;
        let off = g.cell_off(cell) + CELL_META_SIZE + g.key_area;
        &self.map[off..off + len]
    }

    pub fn set_cell_value(&mut self, g: &Geometry, cell: u32, value: &[u8]) {
        self.write_u32(g.cell_off(cell) + CELL_VAL_LEN, value.len() as u32);
        let off = g.cell_off(cell) + CELL_META_SIZE + g.key_area;
        self.map[off..off + value.len()].copy_from_slice(value);
    }
}
