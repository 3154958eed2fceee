//! Error types for topology construction.

use slot_types::{AreaId, ZoneId};
use thiserror::Error;

/// Errors raised while building or reshaping a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("zone already exists: {0}")]
    DuplicateZone(ZoneId),

    #[error("area already exists: {0}")]
    DuplicateArea(AreaId),

    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    #[error("area not found: {0}")]
    AreaNotFound(AreaId),

    /// Removal refused because slots are reserved or occupied.
    #[error("still in use: {0}")]
    InUse(String),
}

/// Convenience result type for topology operations.
pub type TopologyResult<T> = Result<T, TopologyError>;
