//! Error types for the crcsweep core library

use thiserror::Error;

/// Main error type for crcsweep operations
#[derive(Error, Debug)]
pub enum Error {
    /// Scan root does not exist
    #[error("Path not found: {0}")]
    NotFound(String),

    /// Scan root exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(String),

    /// IO error while reading a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Text that is not an 8-digit hexadecimal CRC-32
    #[error("Invalid CRC-32 value: {0}")]
    InvalidChecksum(String),

    /// Operation was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// A verification job was started without any records
    #[error("Cannot start a verification job with no files")]
    EmptyJob,

    /// A verification job was started more than once
    #[error("Verification job has already been started")]
    JobAlreadyStarted,

    /// The verification worker thread panicked
    #[error("Verification worker terminated unexpectedly")]
    WorkerPanicked,
}

impl Error {
    /// Whether this error means the scan root is unusable
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::NotADirectory(_))
    }
}

/// Result type alias using the crcsweep error type
pub type Result<T> = std::result::Result<T, Error>;
