//! The aggregation session: explicit owner of both tables.
//!
//! One session spans one attach-to-teardown lifetime. Handlers take
//! `&self` and are safe to call from any number of threads; all shared
//! state lives behind single-key atomic primitives.

use crate::aggregate::bucket::latency_slot;
use crate::aggregate::correlate::CorrelationTable;
use crate::aggregate::histogram::HistogramStore;
use crate::core::{EngineConfig, HistKey, MonotonicClock};
use serde::Serialize;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Correlates begin/end events by key and accumulates log2 latency
/// histograms per dimension tuple.
pub struct AggregationSession<K, D> {
    starts: CorrelationTable<K>,
    histograms: HistogramStore<D>,
    clock: Arc<dyn MonotonicClock>,
    max_slot: u16,
    unmatched_ends: AtomicU64,
}

/// Observability counters for one session.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SessionStats {
    /// Operations currently in flight (begin seen, end pending)
    pub in_flight: usize,
    /// Distinct histogram keys created so far
    pub histogram_keys: usize,
    /// Begins dropped because the correlation table was full
    pub dropped_begins: u64,
    /// Increments dropped because the histogram store was full
    pub dropped_increments: u64,
    /// Ends that found no matching begin
    pub unmatched_ends: u64,
}

impl<K, D> AggregationSession<K, D>
where
    K: Eq + Hash,
    D: Eq + Hash + Copy + Ord,
{
    /// Create a session from engine configuration and a shared clock.
    ///
    /// The clock must be the one the triggering contexts observe; begin
    /// and end readings are only comparable on the same timeline.
    pub fn new(config: &EngineConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        tracing::info!(
            correlation_capacity = config.correlation_capacity,
            histogram_capacity = config.histogram_capacity,
            max_latency_slot = config.max_latency_slot,
            "aggregation session started"
        );
        Self {
            starts: CorrelationTable::new(config.correlation_capacity),
            histograms: HistogramStore::new(config.histogram_capacity),
            clock,
            max_slot: config.max_latency_slot,
            unmatched_ends: AtomicU64::new(0),
        }
    }

    /// Begin handler: timestamp the operation and record it in flight.
    ///
    /// Never fails observably. A duplicate begin overwrites the prior
    /// timestamp; a begin at capacity is dropped.
    pub fn on_begin(&self, key: K) {
        self.starts.record_start(key, self.clock.now_ns());
    }

    /// End handler: close out the operation and accumulate its latency.
    ///
    /// A key with no recorded begin is an ignored miss (began before
    /// the session started, was evicted, or duplicated an earlier end).
    /// Otherwise two independent increments are issued: +1 to the count
    /// bucket for the elapsed duration, and +elapsed_us to the sum slot
    /// of the same dimension tuple. Either may be dropped at capacity
    /// without affecting the other.
    pub fn on_end(&self, key: K, dims: D) {
        let Some(start_ns) = self.starts.take_start(&key) else {
            self.unmatched_ends.fetch_add(1, Ordering::Relaxed);
            return;
        };

        // The clock is monotonic and shared, so saturation only guards
        // a same-nanosecond read pair; that records as slot 0.
        let elapsed_us = self.clock.now_ns().saturating_sub(start_ns) / 1_000;
        let slot = latency_slot(elapsed_us, self.max_slot);

        self.histograms.increment(HistKey::new(dims, slot), 1);
        self.histograms
            .increment(HistKey::new(dims, self.max_slot + 1), elapsed_us);
    }

    /// Export the histogram contents, sorted by dims then slot.
    pub fn snapshot(&self) -> Vec<(HistKey<D>, u64)> {
        self.histograms.snapshot_all()
    }

    /// Highest regular latency bucket for this session.
    pub fn max_slot(&self) -> u16 {
        self.max_slot
    }

    /// Index of the reserved sum slot for this session.
    pub fn sum_slot(&self) -> u16 {
        self.max_slot + 1
    }

    /// Operations currently in flight.
    pub fn in_flight(&self) -> usize {
        self.starts.len()
    }

    /// Current observability counters.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            in_flight: self.starts.len(),
            histogram_keys: self.histograms.len(),
            dropped_begins: self.starts.dropped_begins(),
            dropped_increments: self.histograms.dropped_increments(),
            unmatched_ends: self.unmatched_ends.load(Ordering::Relaxed),
        }
    }
}

impl<K, D> Drop for AggregationSession<K, D> {
    fn drop(&mut self) {
        tracing::info!("aggregation session torn down");
    }
}
