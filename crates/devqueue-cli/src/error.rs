//! Error types for the devqueue CLI.

use thiserror::Error;

use devqueue::DevQueueError;

/// CLI result type alias.
pub type CliResult<T> = Result<T, CliError>;

/// CLI error type.
#[derive(Error, Debug)]
pub enum CliError {
    /// IO error while writing reports.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Queue manager error.
    #[error("{0}")]
    DevQueue(#[from] DevQueueError),

    /// Self-test failure.
    #[error("Check failed: {0}")]
    Check(String),
}
