//! Bounded key -> start-timestamp table for in-flight operations.

use ahash::RandomState;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Correlates begin events with their matching end events.
///
/// Entries are created on begin and consumed (read + deleted) on end.
/// An operation whose end never arrives stays in the table until the
/// session is torn down; there is no expiry or cross-key eviction. The
/// only bound is capacity: once full, begins for new keys are dropped
/// and the matching end will later be an ignored miss.
pub struct CorrelationTable<K> {
    entries: DashMap<K, u64, RandomState>,
    capacity: usize,
    dropped_begins: AtomicU64,
}

impl<K: Eq + Hash> CorrelationTable<K> {
    /// Create a table bounded at `capacity` in-flight operations.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            capacity,
            dropped_begins: AtomicU64::new(0),
        }
    }

    /// Record the start of an operation.
    ///
    /// A duplicate begin for an in-flight key overwrites the prior
    /// timestamp (last-write-wins): on key reuse after a missed end
    /// this self-heals, at the cost of discarding the orphaned prior
    /// measurement. At capacity, begins for new keys are dropped with
    /// no error; the caller cannot block or retry.
    pub fn record_start(&self, key: K, ts_ns: u64) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            // The len/insert pair races with concurrent inserts, so
            // capacity is a bound on effort rather than an exact
            // ceiling. Acceptable: approximate-under-load is the
            // documented tradeoff.
            self.dropped_begins.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("correlation table full, begin dropped");
            return;
        }
        self.entries.insert(key, ts_ns);
    }

    /// Atomically look up and remove the start timestamp for `key`.
    ///
    /// Returns `None` for a key that was never recorded, was dropped
    /// at capacity, or was already consumed by an earlier end.
    pub fn take_start(&self, key: &K) -> Option<u64> {
        self.entries.remove(key).map(|(_, ts)| ts)
    }

    /// Number of operations currently in flight.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no operation is in flight.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Begins dropped because the table was full.
    pub fn dropped_begins(&self) -> u64 {
        self.dropped_begins.load(Ordering::Relaxed)
    }
}
