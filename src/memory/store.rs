//! Thread-safe in-process store: fingerprint map + entry slab + policy list.
//!
//! Concurrency discipline:
//! - One `RwLock` guards the map, the slab, and the order list together.
//!   Splitting them would open windows where an entry exists in one
//!   structure and not the other.
//! - A hit mutates policy metadata for LRU/MRU/LFU, so those lookups take
//!   the write lock. FIFO hits mutate nothing and complete under the read
//!   lock.
//! - `hits`/`misses` are atomics so the FIFO read path can count without
//!   the write lock. Counters are updated inside the same critical section
//!   as the lookup they describe.
//!
//! TTL reclamation is lazy: an expired entry is purged by the lookup or
//! insert that touches it, or by the pre-eviction sweep when the store is
//! full.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::key::{Args, Fingerprint};
use crate::policy::{self, list_victim, move_to_tail, push_tail, unlink, OrderLinks, Strategy, NIL};
use crate::stats::CacheInfo;
use crate::timefn::{is_expired, monotonic_micros, ttl_to_micros, DurationUs};

// ─────────────────────────────────────────────────────────────────────────────
// Entry and slab state
// ─────────────────────────────────────────────────────────────────────────────

struct Entry<V> {
    fingerprint: Fingerprint,
    value: V,
    inserted_at: DurationUs,
    last_access: DurationUs,
    freq: u64,
    seq: u64,
    prev: u32,
    next: u32,
}

/// Everything the lock guards. The order list is threaded through the slab
/// entries; `free` recycles slab indices so the slab never grows past the
/// high-water mark of live entries.
struct State<V> {
    map: HashMap<Fingerprint, u32>,
    slab: Vec<Option<Entry<V>>>,
    free: Vec<u32>,
    head: u32,
    tail: u32,
    seq: u64,
}

impl<V> State<V> {
    fn new() -> Self {
        State {
            map: HashMap::new(),
            slab: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            seq: 0,
        }
    }

    fn entry(&self, idx: u32) -> &Entry<V> {
        self.slab[idx as usize]
            .as_ref()
            .expect("map and order list reference only live slab entries")
    }

    fn entry_mut(&mut self, idx: u32) -> &mut Entry<V> {
        self.slab[idx as usize]
            .as_mut()
            .expect("map and order list reference only live slab entries")
    }

    fn next_seq(&mut self) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    fn alloc(&mut self, entry: Entry<V>) -> u32 {
        match self.free.pop() {
            Some(idx) => {
                self.slab[idx as usize] = Some(entry);
                idx
            }
            None => {
                self.slab.push(Some(entry));
                (self.slab.len() - 1) as u32
            }
        }
    }

    /// Drop a live entry: unlink it, erase its map key, recycle its slot.
    fn remove(&mut self, idx: u32) {
        unlink(self, idx);
        let entry = self.slab[idx as usize]
            .take()
            .expect("remove targets a live entry");
        self.map.remove(&entry.fingerprint);
        self.free.push(idx);
    }

    /// Reclaim every expired entry. Called before eviction so a stale entry
    /// never pushes out a live one.
    fn purge_expired(&mut self, ttl_micros: u64, now: DurationUs) {
        if ttl_micros == 0 {
            return;
        }
        let mut expired = Vec::new();
        let mut cur = self.head;
        while cur != NIL {
            let e = self.entry(cur);
            if is_expired(e.inserted_at, ttl_micros, now) {
                expired.push(cur);
            }
            cur = e.next;
        }
        for idx in expired {
            self.remove(idx);
        }
    }

    /// `(index, freq, seq)` of every live entry, in list order. Input for
    /// the LFU victim scan.
    fn live_freqs(&self) -> Vec<(u32, u64, u64)> {
        let mut out = Vec::with_capacity(self.map.len());
        let mut cur = self.head;
        while cur != NIL {
            let e = self.entry(cur);
            out.push((cur, e.freq, e.seq));
            cur = e.next;
        }
        out
    }
}

impl<V> OrderLinks for State<V> {
    fn head(&self) -> u32 {
        self.head
    }
    fn set_head(&mut self, idx: u32) {
        self.head = idx;
    }
    fn tail(&self) -> u32 {
        self.tail
    }
    fn set_tail(&mut self, idx: u32) {
        self.tail = idx;
    }
    fn prev(&self, idx: u32) -> u32 {
        self.entry(idx).prev
    }
    fn set_prev(&mut self, idx: u32, to: u32) {
        self.entry_mut(idx).prev = to;
    }
    fn next(&self, idx: u32) -> u32 {
        self.entry(idx).next
    }
    fn set_next(&mut self, idx: u32, to: u32) {
        self.entry_mut(idx).next = to;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// MemoryStore
// ─────────────────────────────────────────────────────────────────────────────

/// Thread-safe in-process cache with per-policy eviction and optional TTL.
///
/// Values are stored by ownership and handed out as clones; wrap expensive
/// payloads in `Arc` at the call site if cloning matters.
pub struct MemoryStore<V> {
    strategy: Strategy,
    max_size: usize,
    ttl_micros: u64,
    hits: AtomicU64,
    misses: AtomicU64,
    state: RwLock<State<V>>,
}

impl<V: Clone> MemoryStore<V> {
    /// Create a store. `max_size` must be positive; `ttl` of `None`
    /// disables expiry.
    pub fn new(
        strategy: Strategy,
        max_size: usize,
        ttl: Option<Duration>,
    ) -> Result<Self, ConfigError> {
        if max_size == 0 {
            return Err(ConfigError::ZeroMaxSize);
        }
        Ok(MemoryStore {
            strategy,
            max_size,
            ttl_micros: ttl_to_micros(ttl),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            state: RwLock::new(State::new()),
        })
    }

    /// Look up by call arguments. Counts a hit or a miss; a hit refreshes
    /// the entry's policy metadata.
    pub fn get(&self, args: &Args) -> Option<V> {
        self.lookup(&Fingerprint::from_args(args))
    }

    /// Store a value under the given arguments, evicting if at capacity.
    pub fn set(&self, args: &Args, value: &V) {
        self.insert(Fingerprint::from_args(args), value);
    }

    pub(crate) fn lookup(&self, fp: &Fingerprint) -> Option<V> {
        let now = monotonic_micros();

        // FIFO hits mutate no policy metadata: resolve them under the
        // shared lock. Expired entries still need the write path below.
        if self.strategy == Strategy::Fifo {
            let st = self.state.read();
            match st.map.get(fp).copied() {
                None => {
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                Some(idx) => {
                    let e = st.entry(idx);
                    if !is_expired(e.inserted_at, self.ttl_micros, now) {
                        self.hits.fetch_add(1, Ordering::Relaxed);
                        return Some(e.value.clone());
                    }
                }
            }
            // Fall through with the read lock released to purge the
            // expired entry.
        }

        let mut st = self.state.write();
        match st.map.get(fp).copied() {
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(idx) => {
                // TTL check precedes hit accounting.
                if is_expired(st.entry(idx).inserted_at, self.ttl_micros, now) {
                    st.remove(idx);
                    self.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                match self.strategy {
                    Strategy::Lru | Strategy::Mru => {
                        move_to_tail(&mut *st, idx);
                        st.entry_mut(idx).last_access = now;
                    }
                    Strategy::Lfu => st.entry_mut(idx).freq += 1,
                    Strategy::Fifo => {}
                }
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(st.entry(idx).value.clone())
            }
        }
    }

    pub(crate) fn insert(&self, fp: Fingerprint, value: &V) {
        let now = monotonic_micros();
        let mut st = self.state.write();

        if let Some(idx) = st.map.get(&fp).copied() {
            // Overwrite in place as a fresh insertion: new value, new age,
            // reset frequency, new list position.
            let seq = st.next_seq();
            let e = st.entry_mut(idx);
            e.value = value.clone();
            e.inserted_at = now;
            e.last_access = now;
            e.freq = 0;
            e.seq = seq;
            move_to_tail(&mut *st, idx);
            return;
        }

        if st.map.len() >= self.max_size {
            st.purge_expired(self.ttl_micros, now);
        }
        if st.map.len() >= self.max_size {
            let victim = match self.strategy {
                Strategy::Lfu => policy::lfu_victim(st.live_freqs()),
                _ => list_victim(&*st, self.strategy),
            };
            if victim != NIL {
                st.remove(victim);
            }
        }

        let seq = st.next_seq();
        let idx = st.alloc(Entry {
            fingerprint: fp.clone(),
            value: value.clone(),
            inserted_at: now,
            last_access: now,
            freq: 0,
            seq,
            prev: NIL,
            next: NIL,
        });
        push_tail(&mut *st, idx);
        st.map.insert(fp, idx);
    }

    /// Drop every entry and reset all counters to zero.
    pub fn clear(&self) {
        let mut st = self.state.write();
        *st = State::new();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    /// Immutable statistics snapshot.
    pub fn info(&self) -> CacheInfo {
        let current_size = self.state.read().map.len();
        CacheInfo {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            current_size,
            max_size: self.max_size,
        }
    }
}
