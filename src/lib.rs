//! Latmon - lock-free latency histogram aggregation.
//!
//! Latmon turns paired begin/end events from external instrumentation
//! points into compact log2-scale latency histograms. It is built around
//! the execution contract of a kernel-resident probe runtime: handlers
//! never block, never retry, never allocate on the hot path beyond a
//! bounded map insert, and every failure mode degrades to a dropped
//! observation rather than an error.
//!
//! # Architecture
//!
//! - `aggregate`: the correlation table, histogram store, bucketizer,
//!   and the session object tying them together
//! - `probes`: trigger-boundary adapters for the two shipped
//!   instrumentation surfaces (block I/O, direct memory reclaim)
//! - `export`: snapshot grouping and text/JSON rendering
//! - `core`: domain types, configuration, and errors
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```
//! use latmon_lib::aggregate::AggregationSession;
//! use latmon_lib::core::{EngineConfig, ManualClock};
//! use std::sync::Arc;
//!
//! let clock = Arc::new(ManualClock::new(0));
//! let session: AggregationSession<u64, ()> =
//!     AggregationSession::new(&EngineConfig::default(), clock.clone());
//!
//! session.on_begin(42);
//! clock.advance(5_000); // 5us later
//! session.on_end(42, ());
//!
//! let snapshot = session.snapshot();
//! assert_eq!(snapshot.len(), 2); // one count bucket + the sum slot
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod aggregate;
pub mod cli;
pub mod core;
pub mod export;
pub mod probes;
pub mod synth;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
