//! Eviction strategies and the order-list bookkeeping both backends share.
//!
//! Covers:
//! - [`Strategy`]: the four eviction policies with their stable wire ids
//!   (stored in the shared region header).
//! - [`OrderLinks`]: the seam over an intrusive doubly linked list of live
//!   entries. The in-process store implements it over a slab; the shared
//!   store implements it over prev/next fields inside mmap'd cells. The
//!   algorithms below are the only writers of the list, so the two backends
//!   cannot drift in ordering semantics.
//! - Victim selection: head/tail picks for LRU/MRU/FIFO, and the
//!   `(access_count, insertion_seq)` minimum for LFU with the mandatory
//!   oldest-insertion tie-break.
//!
//! List orientation: head = coldest (least recently used / first inserted),
//! tail = hottest. Every strategy appends new entries at the tail; only LRU
//! and MRU move entries on hit.

/// Sentinel index for "no entry". Both backends use u32 indices, so the
/// all-ones pattern is never a valid slab or cell index.
pub const NIL: u32 = u32::MAX;

// ─────────────────────────────────────────────────────────────────────────────
// Strategy
// ─────────────────────────────────────────────────────────────────────────────

/// Eviction policy of a cache. The discriminants are the wire ids written
/// into the shared region header; reordering them would make existing
/// regions attach as a different cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Strategy {
    /// Evict the least recently used entry.
    #[default]
    Lru = 0,
    /// Evict the most recently used entry.
    Mru = 1,
    /// Evict in insertion order; hits do not reorder.
    Fifo = 2,
    /// Evict the least frequently used entry; ties go to the oldest
    /// insertion.
    Lfu = 3,
}

impl Strategy {
    /// Stable id stored in the shared region header.
    #[inline]
    pub fn id(self) -> u8 {
        self as u8
    }

    /// Inverse of [`Strategy::id`]; `None` for ids this version does not
    /// know.
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Strategy::Lru),
            1 => Some(Strategy::Mru),
            2 => Some(Strategy::Fifo),
            3 => Some(Strategy::Lfu),
            _ => None,
        }
    }

    /// Whether a hit moves the entry within the order list.
    #[inline]
    pub fn reorders_on_hit(self) -> bool {
        matches!(self, Strategy::Lru | Strategy::Mru)
    }

    /// All strategies, for tests and benchmarks that sweep the matrix.
    pub const ALL: [Strategy; 4] = [Strategy::Lru, Strategy::Mru, Strategy::Fifo, Strategy::Lfu];
}

// ─────────────────────────────────────────────────────────────────────────────
// OrderLinks: the intrusive list seam
// ─────────────────────────────────────────────────────────────────────────────

/// Accessor seam over the intrusive order list.
///
/// Implementors guarantee that `prev`/`next` of a live index are either
/// another live index or [`NIL`], and that `head`/`tail` are [`NIL`] exactly
/// when the list is empty.
pub trait OrderLinks {
    fn head(&self) -> u32;
    fn set_head(&mut self, idx: u32);
    fn tail(&self) -> u32;
    fn set_tail(&mut self, idx: u32);
    fn prev(&self, idx: u32) -> u32;
    fn set_prev(&mut self, idx: u32, to: u32);
    fn next(&self, idx: u32) -> u32;
    fn set_next(&mut self, idx: u32, to: u32);
}

/// Append `idx` at the tail (hottest end) of the list.
pub fn push_tail<L: OrderLinks + ?Sized>(links: &mut L, idx: u32) {
    let old_tail = links.tail();
    links.set_prev(idx, old_tail);
    links.set_next(idx, NIL);
    if old_tail == NIL {
        links.set_head(idx);
    } else {
        links.set_next(old_tail, idx);
    }
    links.set_tail(idx);
}

/// Remove `idx` from wherever it sits in the list.
pub fn unlink<L: OrderLinks + ?Sized>(links: &mut L, idx: u32) {
    let prev = links.prev(idx);
    let next = links.next(idx);
    if prev == NIL {
        links.set_head(next);
    } else {
        links.set_next(prev, next);
    }
    if next == NIL {
        links.set_tail(prev);
    } else {
        links.set_prev(next, prev);
    }
    links.set_prev(idx, NIL);
    links.set_next(idx, NIL);
}

/// Move `idx` to the tail. Used on LRU/MRU hits.
pub fn move_to_tail<L: OrderLinks + ?Sized>(links: &mut L, idx: u32) {
    if links.tail() == idx {
        return;
    }
    unlink(links, idx);
    push_tail(links, idx);
}

/// Victim index for the list-ordered strategies.
///
/// LRU and FIFO evict the head (coldest / first inserted); MRU evicts the
/// tail. LFU is not served by the list position; use [`lfu_victim`].
pub fn list_victim<L: OrderLinks + ?Sized>(links: &L, strategy: Strategy) -> u32 {
    match strategy {
        Strategy::Lru | Strategy::Fifo => links.head(),
        Strategy::Mru => links.tail(),
        Strategy::Lfu => NIL,
    }
}

/// LFU victim: minimum `(access_count, insertion_seq)` over the live
/// entries. The sequence component makes the pick deterministic: among
/// equally cold entries the oldest insertion loses.
///
/// The iterator yields `(index, access_count, insertion_seq)` for every live
/// entry; callers walk their order list to produce it, so the scan is
/// bounded by the cache capacity.
pub fn lfu_victim<I>(entries: I) -> u32
where
    I: IntoIterator<Item = (u32, u64, u64)>,
{
    let mut best = NIL;
    let mut best_key = (u64::MAX, u64::MAX);
    for (idx, freq, seq) in entries {
        if (freq, seq) < best_key {
            best_key = (freq, seq);
            best = idx;
        }
    }
    best
}
