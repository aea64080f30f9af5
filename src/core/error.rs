use thiserror::Error;

/// Errors surfaced by the configuration, CLI, and export layers.
///
/// The aggregation engine itself never returns an error: under its
/// non-blocking contract every failure mode degrades to a silently
/// dropped observation (see the drop counters on a session).
#[derive(Error, Debug)]
pub enum LatmonError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("Channel send error")]
    ChannelSend,
}

/// Result type alias for Latmon operations
pub type Result<T> = std::result::Result<T, LatmonError>;

impl LatmonError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new parse error
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Creates a new replay error
    pub fn replay<S: Into<String>>(msg: S) -> Self {
        Self::Replay(msg.into())
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) | Self::Parse { .. } => "serialization",
            Self::Replay(_) => "replay",
            Self::ChannelSend => "channel",
        }
    }
}
