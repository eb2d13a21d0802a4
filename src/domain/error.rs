//! Domain error types

use thiserror::Error;

/// Errors that can occur in the filterbank engine
#[derive(Error, Debug)]
pub enum FilterbankError {
    /// Malformed construction or reconfiguration parameters. Surfaced
    /// immediately at construction/reconfiguration time, never deferred
    /// to the first push.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filter design could not meet the requested attenuation even after
    /// the bounded ripple-relaxation retries.
    #[error("Filter design failed to converge: {0}")]
    Convergence(String),
}

/// Result type alias for filterbank operations
pub type FilterbankResult<T> = Result<T, FilterbankError>;
