//! Domain types shared across the aggregation engine.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Composite histogram key: a dimension tuple plus a latency slot.
///
/// Slots `0..=max_slot` are log2 count buckets; slot `max_slot + 1` is
/// the reserved sum slot holding the running total of raw latencies
/// for the dimension tuple. Derived ordering sorts by dimensions first,
/// then slot, which is the order `snapshot_all` exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HistKey<D> {
    /// Auxiliary classification dimensions (e.g. device, operation class)
    pub dims: D,
    /// Latency bucket index, or the sum slot
    pub slot: u16,
}

impl<D> HistKey<D> {
    /// Create a key for a count bucket or the sum slot.
    pub fn new(dims: D, slot: u16) -> Self {
        Self { dims, slot }
    }
}

/// Monotonic time source shared by the begin and end handlers.
///
/// Both handlers of one session must read the same clock; elapsed time
/// is only meaningful within a single session's timeline.
pub trait MonotonicClock: Send + Sync {
    /// Nanoseconds since an arbitrary fixed origin. Never decreases.
    fn now_ns(&self) -> u64;
}

/// Wall-clock backed monotonic time, anchored at construction.
#[derive(Debug)]
pub struct SystemClock {
    anchor: Instant,
}

impl SystemClock {
    /// Create a clock anchored at the current instant.
    pub fn new() -> Self {
        Self {
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock for SystemClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ns(&self) -> u64 {
        // Instant::elapsed cannot exceed u64 nanoseconds within any
        // realistic session lifetime (>500 years).
        self.anchor.elapsed().as_nanos() as u64
    }
}

/// Manually driven clock for tests and event-stream replay.
#[derive(Debug)]
pub struct ManualClock {
    now_ns: AtomicU64,
}

impl ManualClock {
    /// Create a clock at the given origin.
    pub fn new(origin_ns: u64) -> Self {
        Self {
            now_ns: AtomicU64::new(origin_ns),
        }
    }

    /// Advance the clock by `delta_ns`.
    pub fn advance(&self, delta_ns: u64) {
        self.now_ns.fetch_add(delta_ns, Ordering::Relaxed);
    }

    /// Move the clock forward to `at_ns`. A target behind the current
    /// reading is ignored, preserving monotonicity.
    pub fn advance_to(&self, at_ns: u64) {
        self.now_ns.fetch_max(at_ns, Ordering::Relaxed);
    }
}

impl MonotonicClock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now_ns.load(Ordering::Relaxed)
    }
}
