//! Error types for the CLI

use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur in the CLI
#[derive(Debug, Error)]
pub enum CliError {
    /// The suite did not finish in time
    #[error("Suite did not finish within {ms}ms")]
    SuiteTimeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Harness library error
    #[error(transparent)]
    Harness(#[from] chatfocus::HarnessError),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
