//! Cross-process cache store over the mapped region.
//!
//! Every operation is one critical section: take the in-process mutex
//! (flock is per open file description, so threads must be serialized
//! first), then the advisory file lock, then mutate the region. The user's
//! function never runs inside either lock.
//!
//! Slot selection is linear probing on the deterministic xxh64 of the
//! fingerprint bytes; equality is confirmed against the full key bytes.
//! Tombstones keep probe chains alive across deletions and are reused by
//! inserts. Ordering observed by any one process may lag other processes
//! between lock acquisitions; eviction therefore picks a plausible victim,
//! while counters and the capacity bound stay strict.

use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config;
use crate::error::{ConfigError, SharedCacheError};
use crate::key::{Args, Fingerprint};
use crate::policy::{
    self, list_victim, move_to_tail, push_tail, unlink, OrderLinks, Strategy, NIL,
};
use crate::shared::layout::{Geometry, SharedConfig, SLOT_EMPTY, SLOT_OCCUPIED, SLOT_TOMBSTONE};
use crate::shared::lock::RegionLock;
use crate::shared::region::Region;
use crate::stats::SharedCacheInfo;
use crate::timefn::{is_expired, monotonic_micros, DurationUs};
use crate::value::{decode_value, encode_value};

// ─────────────────────────────────────────────────────────────────────────────
// SharedStore
// ─────────────────────────────────────────────────────────────────────────────

/// Cross-process cache store backed by `<name>.data` + `<name>.lock` in the
/// scratch directory. Any process that opens the same name with the same
/// configuration attaches to the same entries.
pub struct SharedStore<V> {
    cfg: SharedConfig,
    geom: Geometry,
    lock: RegionLock,
    region: Mutex<Region>,
    data_path: PathBuf,
    _values: PhantomData<fn() -> V>,
}

impl<V> SharedStore<V>
where
    V: Serialize + DeserializeOwned,
{
    /// Open (attaching or creating) the named cache in the default scratch
    /// directory.
    pub fn open(name: &str, cfg: SharedConfig) -> Result<Self, SharedCacheError> {
        Self::open_in(&config::scratch_dir(), name, cfg)
    }

    /// Open the named cache under an explicit directory. The directory is
    /// created if missing; the region files are created or reinitialized
    /// as needed.
    pub fn open_in(dir: &Path, name: &str, cfg: SharedConfig) -> Result<Self, SharedCacheError> {
        cfg.validate()?;
        validate_name(name)?;
        fs::create_dir_all(dir).map_err(SharedCacheError::Io)?;

        let data_path = dir.join(format!("{name}.data"));
        let lock_path = dir.join(format!("{name}.lock"));
        let geom = Geometry::for_config(&cfg);

        let lock = RegionLock::open(&lock_path)?;
        let region = {
            let _guard = lock.acquire()?;
            Region::attach(&data_path, &cfg, &geom)?
        };

        Ok(SharedStore {
            cfg,
            geom,
            lock,
            region: Mutex::new(region),
            data_path,
            _values: PhantomData,
        })
    }

    /// Path of the mapped data file (the `.lock` sibling sits next to it).
    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    /// Look up by call arguments; counts a hit or a miss, refreshes policy
    /// metadata on a fresh hit, reclaims the entry on an expired one.
    pub fn get(&self, args: &Args) -> Option<V> {
        self.lookup(&Fingerprint::from_args(args))
    }

    /// Store a value under the given arguments, evicting if at capacity.
    pub fn set(&self, args: &Args, value: &V) {
        self.insert(&Fingerprint::from_args(args), value);
    }

    pub(crate) fn lookup(&self, fp: &Fingerprint) -> Option<V> {
        if fp.len() > self.cfg.max_key_size {
            // Key can never live in a cell; the call bypasses the cache.
            self.with_region(|r, _| r.bump_oversize_skips());
            return None;
        }
        let now = monotonic_micros();
        self.with_region(|r, this| match probe(r, &this.geom, fp) {
            Probe::Found { cell, .. } => {
                // TTL check precedes hit accounting.
                if is_expired(r.cell_inserted_at(&this.geom, cell), this.cfg.ttl_micros, now) {
                    remove_entry(r, &this.geom, cell);
                    r.bump_misses();
                    return None;
                }
                match decode_value::<V>(r.cell_value(&this.geom, cell)) {
                    Ok(value) => {
                        touch(r, &this.geom, this.cfg.strategy, cell, now);
                        r.bump_hits();
                        Some(value)
                    }
                    Err(e) => {
                        // Written by an incompatible type; drop it so the
                        // slot can hold something readable.
                        debug!("dropping undecodable cache entry: {e}");
                        remove_entry(r, &this.geom, cell);
                        r.bump_misses();
                        None
                    }
                }
            }
            Probe::Vacant(_) => {
                r.bump_misses();
                None
            }
        })
        .flatten()
    }

    pub(crate) fn insert(&self, fp: &Fingerprint, value: &V) {
        if fp.len() > self.cfg.max_key_size {
            // Already counted by the lookup half of the call; storing is a
            // silent no-op.
            return;
        }
        let bytes = match encode_value(value) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("value not encodable, bypassing cache: {e}");
                return;
            }
        };
        if bytes.len() > self.cfg.max_value_size {
            self.with_region(|r, _| r.bump_oversize_skips());
            return;
        }

        let now = monotonic_micros();
        self.with_region(|r, this| {
            let g = &this.geom;
            if let Probe::Found { cell, .. } = probe(r, g, fp) {
                // Overwrite in place as a fresh insertion.
                let seq = r.next_seq();
                r.set_cell_value(g, cell, &bytes);
                r.set_cell_inserted_at(g, cell, now);
                r.set_cell_last_access(g, cell, now);
                r.set_cell_freq(g, cell, 0);
                r.set_cell_seq(g, cell, seq);
                move_to_tail(&mut RegionLinks { region: r, geom: g }, cell);
                return;
            }

            if r.current_size() >= g.capacity {
                purge_expired(r, g, this.cfg.ttl_micros, now);
            }
            if r.current_size() >= g.capacity {
                evict_victim(r, g, this.cfg.strategy);
            }

            // Re-probe: eviction may have tombstoned a slot earlier in this
            // key's chain, and the insert must use the canonical position.
            let slot = match probe(r, g, fp) {
                Probe::Vacant(slot) => slot,
                // Unreachable in practice (nothing inserted this key since
                // the miss above), but harmless to honor.
                Probe::Found { slot, .. } => slot,
            };

            let cell = pop_free(r, g);
            r.set_cell_key(g, cell, fp.bytes());
            r.set_cell_value(g, cell, &bytes);
            r.set_cell_inserted_at(g, cell, now);
            r.set_cell_last_access(g, cell, now);
            r.set_cell_freq(g, cell, 0);
            let seq = r.next_seq();
            r.set_cell_seq(g, cell, seq);
            r.set_cell_slot(g, cell, slot);

            r.set_slot_hash(g, slot, fp.hash64());
            r.set_slot_cell(g, slot, cell);
            r.set_slot_state(g, slot, SLOT_OCCUPIED);

            push_tail(&mut RegionLinks { region: r, geom: g }, cell);
            let size = r.current_size() + 1;
            r.set_current_size(size);
        });
    }

    /// Drop every entry and zero every counter, for all attached
    /// processes.
    pub fn clear(&self) {
        self.with_region(|r, this| r.initialize(&this.cfg, &this.geom));
    }

    /// Statistics snapshot read from the region header.
    pub fn info(&self) -> SharedCacheInfo {
        self.with_region(|r, _| SharedCacheInfo {
            hits: r.hits(),
            misses: r.misses(),
            oversize_skips: r.oversize_skips(),
            current_size: r.current_size() as usize,
            max_size: self.cfg.max_size,
        })
        .unwrap_or(SharedCacheInfo {
            hits: 0,
            misses: 0,
            oversize_skips: 0,
            current_size: 0,
            max_size: self.cfg.max_size,
        })
    }

    /// One region critical section: in-process mutex, then the file lock.
    ///
    /// A lock failure after a successful attach is close to impossible
    /// (the fd is healthy); if it happens the operation degrades to a
    /// cache bypass rather than poisoning anything.
    fn with_region<R>(&self, f: impl FnOnce(&mut Region, &Self) -> R) -> Option<R> {
        let mut region = self.region.lock();
        let _guard = match self.lock.acquire() {
            Ok(guard) => guard,
            Err(e) => {
                warn!("region lock unavailable, bypassing cache: {e}");
                return None;
            }
        };
        Some(f(&mut region, self))
    }
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyCacheName);
    }
    let path_unsafe = name == "." || name == ".." || name.bytes().any(|b| b == b'/' || b == 0);
    if path_unsafe || name.contains('\\') {
        return Err(ConfigError::InvalidCacheName(name.to_owned()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Probing
// ─────────────────────────────────────────────────────────────────────────────

enum Probe {
    /// The key is resident: its slot and entry cell.
    Found { slot: u32, cell: u32 },
    /// The key is absent; inserting should use this slot (first tombstone
    /// on the chain, else the terminating empty slot).
    Vacant(u32),
}

fn probe(r: &Region, g: &Geometry, fp: &Fingerprint) -> Probe {
    let mask = g.mask();
    let mut idx = (fp.hash64() & mask) as u32;
    let mut first_tombstone = None;
    for _ in 0..g.slot_count {
        match r.slot_state(g, idx) {
            SLOT_EMPTY => return Probe::Vacant(first_tombstone.unwrap_or(idx)),
            SLOT_TOMBSTONE => {
                first_tombstone.get_or_insert(idx);
            }
            _ => {
                if r.slot_hash(g, idx) == fp.hash64() {
                    let cell = r.slot_cell(g, idx);
                    if r.cell_key(g, cell) == fp.bytes() {
                        return Probe::Found { slot: idx, cell };
                    }
                }
            }
        }
        idx = ((idx as u64 + 1) & mask) as u32;
    }
    // Full wrap without an EMPTY slot: the table is saturated with
    // tombstones. Occupied slots never exceed half the table, so a
    // tombstone was seen.
    Probe::Vacant(first_tombstone.unwrap_or((fp.hash64() & mask) as u32))
}

// ─────────────────────────────────────────────────────────────────────────────
// Region-side policy plumbing
// ─────────────────────────────────────────────────────────────────────────────

/// Order-list view over the mapped cells.
struct RegionLinks<'a> {
    region: &'a mut Region,
    geom: &'a Geometry,
}

impl OrderLinks for RegionLinks<'_> {
    fn head(&self) -> u32 {
        self.region.list_head()
    }
    fn set_head(&mut self, idx: u32) {
        self.region.set_list_head(idx);
    }
    fn tail(&self) -> u32 {
        self.region.list_tail()
    }
    fn set_tail(&mut self, idx: u32) {
        self.region.set_list_tail(idx);
    }
    fn prev(&self, idx: u32) -> u32 {
        self.region.cell_prev(self.geom, idx)
    }
    fn set_prev(&mut self, idx: u32, to: u32) {
        self.region.set_cell_prev(self.geom, idx, to);
    }
    fn next(&self, idx: u32) -> u32 {
        self.region.cell_next(self.geom, idx)
    }
    fn set_next(&mut self, idx: u32, to: u32) {
        self.region.set_cell_next(self.geom, idx, to);
    }
}

fn touch(r: &mut Region, g: &Geometry, strategy: Strategy, cell: u32, now: DurationUs) {
    match strategy {
        Strategy::Lru | Strategy::Mru => {
            move_to_tail(&mut RegionLinks { region: r, geom: g }, cell);
            r.set_cell_last_access(g, cell, now);
        }
        Strategy::Lfu => {
            let freq = r.cell_freq(g, cell) + 1;
            r.set_cell_freq(g, cell, freq);
        }
        Strategy::Fifo => {}
    }
}

/// Unlink a live cell, tombstone its slot, and push the cell onto the free
/// list.
fn remove_entry(r: &mut Region, g: &Geometry, cell: u32) {
    unlink(&mut RegionLinks { region: r, geom: g }, cell);
    let slot = r.cell_slot(g, cell);
    r.set_slot_state(g, slot, SLOT_TOMBSTONE);
    let free = r.free_head();
    r.set_cell_next(g, cell, free);
    r.set_free_head(cell);
    let size = r.current_size().saturating_sub(1);
    r.set_current_size(size);
}

/// Take a cell off the free list. The capacity bound guarantees a free
/// cell whenever `current_size < capacity`.
fn pop_free(r: &mut Region, g: &Geometry) -> u32 {
    let cell = r.free_head();
    debug_assert_ne!(cell, NIL, "free list exhausted below capacity");
    let next = r.cell_next(g, cell);
    r.set_free_head(next);
    cell
}

/// Walk the live list and reclaim every expired entry.
fn purge_expired(r: &mut Region, g: &Geometry, ttl_micros: u64, now: DurationUs) {
    if ttl_micros == 0 {
        return;
    }
    let mut expired = Vec::new();
    let mut cur = r.list_head();
    while cur != NIL {
        if is_expired(r.cell_inserted_at(g, cur), ttl_micros, now) {
            expired.push(cur);
        }
        cur = r.cell_next(g, cur);
    }
    for cell in expired {
        remove_entry(r, g, cell);
    }
}

fn evict_victim(r: &mut Region, g: &Geometry, strategy: Strategy) {
    let victim = match strategy {
        Strategy::Lfu => {
            let mut live = Vec::with_capacity(r.current_size() as usize);
            let mut cur = r.list_head();
            while cur != NIL {
                live.push((cur, r.cell_freq(g, cur), r.cell_seq(g, cur)));
                cur = r.cell_next(g, cur);
            }
            policy::lfu_victim(live)
        }
        _ => list_victim(&RegionLinks { region: r, geom: g }, strategy),
    };
    if victim != NIL {
        remove_entry(r, g, victim);
    }
}
