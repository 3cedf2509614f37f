//! Error types for classification rounds
//!
//! Errors are classified by recoverability:
//! - Retryable: the record store could not be read or written
//! - NonRetryable: the observation log itself is unusable
//!
//! An empty log is not an error; it yields a no-op round.

use thiserror::Error;

/// Error types for classifying a spawn point
#[derive(Debug, Error)]
pub enum ClassifyError {
    // Non-retryable errors
    #[error("Malformed observation log: {0}")]
    MalformedInput(String),

    // Retryable errors (by the caller; the core never retries)
    #[error("Record store unavailable: {0}")]
    StoreUnavailable(String),
}

impl ClassifyError {
    /// Returns true if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClassifyError::StoreUnavailable(_))
    }

    /// Get a recovery suggestion for logs
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            ClassifyError::MalformedInput(_) => {
                "Sort detections by scan time before classifying."
            }
            ClassifyError::StoreUnavailable(_) => {
                "Check the database path and disk space, then run the round again."
            }
        }
    }
}
