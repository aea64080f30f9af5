//! Trigger-boundary adapters for the shipped instrumentation surfaces.
//!
//! The probes do not attach to anything themselves: attachment, and
//! extraction of raw fields from the monitored subsystem, belong to an
//! external trigger source. Each probe consumes already-resolved
//! trigger records, derives the operation key and classification
//! dimensions, and drives an [`AggregationSession`].
//!
//! [`AggregationSession`]: crate::aggregate::AggregationSession

pub mod block_io;
pub mod reclaim;

use crate::probes::block_io::RawRequest;
use serde::{Deserialize, Serialize};

/// One captured trigger event, as stored in a replay stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeEvent {
    /// Monotonic timestamp of the trigger, nanoseconds
    pub at_ns: u64,
    /// Which trigger fired
    pub kind: ProbeEventKind,
    /// The raw request record handed over by the trigger source
    pub request: RawRequest,
}

/// The block I/O trigger points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeEventKind {
    /// Request queued (begin)
    Insert,
    /// Request dispatched to the driver (begin; overwrites an insert)
    Issue,
    /// Request finished (end)
    Complete,
}
