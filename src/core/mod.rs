//! Core domain types, configuration, and error handling.

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ConfigBuilder, EngineConfig, LogLevel, LoggingConfig};
pub use error::{LatmonError, Result};
pub use types::{HistKey, ManualClock, MonotonicClock, SystemClock};
