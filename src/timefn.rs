// timefn - monotonic microsecond clock shared by both cache backends.
//
// `std::time::Instant` is opaque and cannot be stored in the mmap'd region,
// so timestamps are raw CLOCK_MONOTONIC microseconds instead. On every
// supported platform CLOCK_MONOTONIC is one timeline for all processes on
// the host, which makes TTL and recency comparisons meaningful across the
// shared backend's participants.

use nix::time::{clock_gettime, ClockId};

/// Microsecond timestamp/duration type used throughout the stores.
pub type DurationUs = u64;

/// Current CLOCK_MONOTONIC reading in microseconds.
///
/// The absolute value is meaningful only relative to other readings from the
/// same boot; use it to compute ages, never wall-clock times.
pub fn monotonic_micros() -> DurationUs {
    // clock_gettime cannot fail for a valid clock id on supported platforms.
    clock_gettime(ClockId::CLOCK_MONOTONIC)
        .map(|ts| ts.tv_sec() as u64 * 1_000_000 + ts.tv_nsec() as u64 / 1_000)
        .unwrap_or_default()
}

/// Convert an optional TTL into header-storable microseconds (0 = no TTL).
pub fn ttl_to_micros(ttl: Option<std::time::Duration>) -> u64 {
    ttl.map(|d| d.as_micros().min(u64::MAX as u128) as u64)
        .unwrap_or(0)
}

/// Whether an entry inserted at `inserted_at` has outlived `ttl_micros` by
/// time `now`. A zero TTL is "no TTL" and never expires.
#[inline]
pub fn is_expired(inserted_at: DurationUs, ttl_micros: u64, now: DurationUs) -> bool {
    ttl_micros != 0 && now.saturating_sub(inserted_at) >= ttl_micros
}
