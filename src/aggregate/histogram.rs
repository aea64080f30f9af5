//! Bounded histogram store with lazy creation and atomic accumulation.

use crate::core::HistKey;
use ahash::RandomState;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

/// Concurrent counter store keyed by dimension tuple + latency slot.
///
/// Counters are monotonically increasing for the lifetime of the
/// session. All accumulation is a fetch-and-add on the entry's atomic;
/// no increment accepted by the store is ever lost, regardless of
/// interleaving. Creation is lazy, on the first observation of a key.
pub struct HistogramStore<D> {
    entries: DashMap<HistKey<D>, AtomicU64, RandomState>,
    capacity: usize,
    dropped_increments: AtomicU64,
}

impl<D: Eq + Hash + Copy + Ord> HistogramStore<D> {
    /// Create a store bounded at `capacity` distinct keys.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            capacity,
            dropped_increments: AtomicU64::new(0),
        }
    }

    /// Add `amount` to the counter for `key`, creating it at zero on
    /// first observation.
    ///
    /// When two callers race on creation the map's entry primitive lets
    /// exactly one insert win and lands both increments on the surviving
    /// counter. When the store is at capacity and the key does not
    /// exist, the increment is dropped silently: no error, no retry,
    /// and no effect on any other entry.
    pub fn increment(&self, key: HistKey<D>, amount: u64) {
        if let Some(counter) = self.entries.get(&key) {
            counter.fetch_add(amount, Ordering::Relaxed);
            return;
        }

        if self.entries.len() >= self.capacity {
            // Same racy-bound caveat as the correlation table: len may
            // briefly lag concurrent creates. Undercounting here is the
            // accepted failure mode, corruption is not.
            self.dropped_increments.fetch_add(1, Ordering::Relaxed);
            tracing::trace!("histogram store full, increment dropped");
            return;
        }

        self.entries
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(amount, Ordering::Relaxed);
    }

    /// Current counter value for `key`, if it exists.
    pub fn get(&self, key: &HistKey<D>) -> Option<u64> {
        self.entries.get(key).map(|c| c.load(Ordering::Relaxed))
    }

    /// Export all entries, sorted by dimension tuple then slot.
    ///
    /// Safe to call concurrently with ongoing increments: each entry is
    /// read atomically and is never stale below a value it has already
    /// reached, but no point-in-time consistency across entries is
    /// implied.
    pub fn snapshot_all(&self) -> Vec<(HistKey<D>, u64)> {
        let mut entries: Vec<(HistKey<D>, u64)> = self
            .entries
            .iter()
            .map(|e| (*e.key(), e.value().load(Ordering::Relaxed)))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Number of distinct keys present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if no key has been observed yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Increments dropped because the store was full.
    pub fn dropped_increments(&self) -> u64 {
        self.dropped_increments.load(Ordering::Relaxed)
    }
}
