//! Direct memory-reclaim latency instrumentation.
//!
//! A task entering direct reclaim is stalled until reclaim finishes,
//! so the operation key is simply the task id: one task can only be in
//! one direct-reclaim episode at a time. There are no classification
//! dimensions; all tasks share a single histogram.

use crate::aggregate::AggregationSession;
use crate::core::{EngineConfig, HistKey, MonotonicClock};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Task identifier correlating reclaim begin and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub u32);

/// Empty dimension tuple: reclaim latency is not partitioned.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct ReclaimDims;

impl std::fmt::Display for ReclaimDims {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "all tasks")
    }
}

/// Direct-reclaim latency probe.
pub struct ReclaimProbe {
    session: AggregationSession<TaskId, ReclaimDims>,
}

impl ReclaimProbe {
    /// Create a reclaim probe.
    pub fn new(config: &EngineConfig, clock: Arc<dyn MonotonicClock>) -> Self {
        Self {
            session: AggregationSession::new(config, clock),
        }
    }

    /// Task entered direct reclaim.
    pub fn on_reclaim_begin(&self, task: TaskId) {
        self.session.on_begin(task);
    }

    /// Task left direct reclaim.
    pub fn on_reclaim_end(&self, task: TaskId) {
        self.session.on_end(task, ReclaimDims);
    }

    /// Export the histogram contents.
    pub fn snapshot(&self) -> Vec<(HistKey<ReclaimDims>, u64)> {
        self.session.snapshot()
    }

    /// The underlying aggregation session.
    pub fn session(&self) -> &AggregationSession<TaskId, ReclaimDims> {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ManualClock;

    #[test]
    fn test_reclaim_latency_single_histogram() {
        let clock = Arc::new(ManualClock::new(0));
        let probe = ReclaimProbe::new(
            &EngineConfig::default(),
            Arc::clone(&clock) as Arc<dyn MonotonicClock>,
        );

        probe.on_reclaim_begin(TaskId(100));
        probe.on_reclaim_begin(TaskId(200));
        clock.advance(33_000); // 33us -> slot 5
        probe.on_reclaim_end(TaskId(100));
        probe.on_reclaim_end(TaskId(200));

        assert_eq!(probe.snapshot(), vec![
            (HistKey::new(ReclaimDims, 5), 2),
            (HistKey::new(ReclaimDims, 28), 66),
        ]);
    }

    #[test]
    fn test_end_without_begin_is_ignored() {
        let clock = Arc::new(ManualClock::new(0));
        let probe = ReclaimProbe::new(
            &EngineConfig::default(),
            Arc::clone(&clock) as Arc<dyn MonotonicClock>,
        );

        probe.on_reclaim_end(TaskId(7));
        assert!(probe.snapshot().is_empty());
    }
}
