//! Configuration management for Latmon.
//!
//! Supports YAML files, environment variable overrides via the CLI,
//! programmatic construction through a builder, and validation.

use crate::core::{LatmonError, Result};
use serde::{Deserialize, Serialize};

/// Default number of log2 latency buckets, matching a max range of
/// 33.6s .. 67.1s at microsecond resolution.
pub const DEFAULT_MAX_LATENCY_SLOT: u16 = 27;

/// Default number of distinct devices the histogram store is sized for.
pub const DEFAULT_MAX_DEVICES: usize = 255;

/// Default capacity of the in-flight correlation table.
pub const DEFAULT_CORRELATION_CAPACITY: usize = 10_000;

/// Complete configuration for Latmon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Aggregation engine configuration
    pub engine: EngineConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Aggregation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Capacity of the in-flight begin-event correlation table
    pub correlation_capacity: usize,
    /// Capacity of the histogram store (distinct dimension+slot keys)
    pub histogram_capacity: usize,
    /// Highest regular latency bucket; the sum slot lives one past it
    pub max_latency_slot: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine: EngineConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            correlation_capacity: DEFAULT_CORRELATION_CAPACITY,
            // One full histogram per device: max_slot + 1 count buckets
            // plus the sum slot.
            histogram_capacity: (DEFAULT_MAX_LATENCY_SLOT as usize + 2) * DEFAULT_MAX_DEVICES,
            max_latency_slot: DEFAULT_MAX_LATENCY_SLOT,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.engine.validate()
    }
}

impl EngineConfig {
    /// Index of the reserved sum slot for this configuration.
    pub fn sum_slot(&self) -> u16 {
        self.max_latency_slot + 1
    }

    /// Validate the engine configuration
    pub fn validate(&self) -> Result<()> {
        if self.correlation_capacity == 0 {
            return Err(LatmonError::config("correlation_capacity must be greater than 0"));
        }

        if self.histogram_capacity == 0 {
            return Err(LatmonError::config("histogram_capacity must be greater than 0"));
        }

        // Slot 62 is the largest bucket a u64 microsecond duration can
        // reach, and the sum slot must stay one past the last bucket.
        if self.max_latency_slot == 0 || self.max_latency_slot > 62 {
            return Err(LatmonError::config(format!(
                "max_latency_slot must be between 1 and 62, got {}",
                self.max_latency_slot
            )));
        }

        let per_tuple = self.max_latency_slot as usize + 2;
        if self.histogram_capacity < per_tuple {
            return Err(LatmonError::config(format!(
                "histogram_capacity {} cannot hold a single dimension tuple ({} entries)",
                self.histogram_capacity, per_tuple
            )));
        }

        Ok(())
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| LatmonError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set correlation table capacity
    pub fn correlation_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.correlation_capacity = capacity;
        self
    }

    /// Set histogram store capacity
    pub fn histogram_capacity(mut self, capacity: usize) -> Self {
        self.config.engine.histogram_capacity = capacity;
        self
    }

    /// Set the highest regular latency bucket
    pub fn max_latency_slot(mut self, slot: u16) -> Self {
        self.config.engine.max_latency_slot = slot;
        self
    }

    /// Set log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
