//! Error types for the allocation system facade.

use slot_rollback::RollbackError;
use slot_topology::TopologyError;
use slot_types::AllocationError;
use thiserror::Error;

/// Errors surfaced by [`AllocationSystem`](crate::AllocationSystem).
#[derive(Debug, Error)]
pub enum SystemError {
    /// Request lifecycle or placement error
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// Topology construction error
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// Rollback or snapshot error
    #[error(transparent)]
    Rollback(#[from] RollbackError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for system operations.
pub type SystemResult<T> = Result<T, SystemError>;
