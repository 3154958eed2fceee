//! Error types for the rollback subsystem.

use thiserror::Error;

/// Errors raised by the operation log, the manager and reversal handlers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RollbackError {
    /// `rollback_k` was asked for zero operations.
    #[error("invalid rollback count: {0}")]
    InvalidCount(usize),

    /// Nothing recorded to roll back.
    #[error("operation history is empty")]
    EmptyHistory,

    /// A reversal handler could not undo its operation.
    #[error("reversal failed: {0}")]
    HandlerFailed(String),

    /// A snapshot could not be captured or read back.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl RollbackError {
    pub fn handler(message: impl Into<String>) -> Self {
        Self::HandlerFailed(message.into())
    }
}

impl From<serde_json::Error> for RollbackError {
    fn from(e: serde_json::Error) -> Self {
        Self::Snapshot(e.to_string())
    }
}

/// Result type for rollback operations.
pub type RollbackResult<T> = Result<T, RollbackError>;
