//! The latency aggregation engine.
//!
//! Performance contract (mirrors the probe-runtime environment this
//! engine models):
//! - No blocking, sleeping, or retry loops on any handler path
//! - Single-key atomic primitives only; no lock spans multiple keys
//! - Bounded memory: both tables refuse inserts past capacity
//! - Every failure mode is a silently dropped observation, never a
//!   crash or a stuck caller

pub mod bucket;
pub mod correlate;
pub mod histogram;
pub mod session;

pub use bucket::{latency_slot, slot_bounds_us};
pub use correlate::CorrelationTable;
pub use histogram::HistogramStore;
pub use session::{AggregationSession, SessionStats};
