//! Result and error types for the focus harness.

use thiserror::Error;

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

/// Errors that can occur while driving a focus scenario
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A polled condition never became true
    #[error("{message} (timed out after {ms}ms)")]
    Timeout {
        /// Diagnostic supplied by the caller of the wait
        message: String,
        /// Timeout in milliseconds
        ms: u64,
    },

    /// The responder never finished its initialization handshake
    #[error("Sidebar handshake did not complete within {ms}ms")]
    HandshakeTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// The peer endpoint of a message channel went away
    #[error("Message channel closed while waiting for {waiting_for}")]
    ChannelClosed {
        /// What the receiver was waiting for
        waiting_for: String,
    },

    /// The panel container dropped an open request without completing it
    #[error("Panel container dropped the open request for {url}")]
    ContainerDropped {
        /// URL of the panel that was being opened
        url: String,
    },

    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HarnessError {
    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error came from a bounded wait running out
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::HandshakeTimeout { .. })
    }
}
