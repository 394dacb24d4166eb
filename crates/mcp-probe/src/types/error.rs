//! Error type shared by every probe module.

use std::time::Duration;

/// Convenience alias used across the crate.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Everything that can go wrong while preparing or running a probe.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    /// The child process could not be started.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        /// Display form of the command line.
        command: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The exchange did not finish before the deadline.
    #[error("no response within {0:?}")]
    Timeout(Duration),

    /// A pipe to the child was missing or closed unexpectedly.
    #[error("transport error: {0}")]
    Transport(String),

    /// Invalid or incomplete configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// The run state machine was asked to leave a terminal state.
    #[error("invalid state transition from {from} to {to}")]
    InvalidTransition {
        /// State the run was in.
        from: String,
        /// State that was requested.
        to: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Config file could not be parsed.
    #[error("failed to parse config: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Config could not be rendered as TOML.
    #[error("failed to render config: {0}")]
    TomlRender(#[from] toml::ser::Error),
}

impl ProbeError {
    /// True when the error means the child closed its end of a pipe.
    pub fn is_broken_pipe(&self) -> bool {
        match self {
            ProbeError::Io(e) => e.kind() == std::io::ErrorKind::BrokenPipe,
            _ => false,
        }
    }
}
