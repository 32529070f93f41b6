//! # Error Types
//!
//! Structured errors for the bulk executor using thiserror.
//!
//! Two families are kept apart on purpose: [`BulkError`] is returned by the
//! engine when the caller misuses it (and aborts the run before any batch
//! starts), while [`OperationError`] describes why a single remote item failed
//! and is only ever recorded as data in the run tally.

use thiserror::Error;

/// Errors surfaced by the executor and its configuration layer
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BulkError {
    #[error("No items selected: a bulk run needs at least one item")]
    EmptyItems,

    #[error("Invalid batch size {batch_size}: must be at least 1")]
    InvalidBatchSize { batch_size: usize },

    #[error("A bulk run is already in progress on this executor")]
    AlreadyRunning,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<config::ConfigError> for BulkError {
    fn from(err: config::ConfigError) -> Self {
        BulkError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BulkError>;

/// Failure of one remote unit of work
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OperationError {
    #[error("Remote error: {message}")]
    Remote { message: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Rejected: {reason}")]
    Rejected { reason: String },
}

impl OperationError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }
}
