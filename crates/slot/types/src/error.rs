//! Error types for allocation operations.

use thiserror::Error;

use crate::{AreaId, RequestId, RequestState, SlotId, ZoneId};

/// Errors surfaced by the request state machine, the queue and the engine.
///
/// All of them are recoverable; none leaves partially-applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// Unknown request id.
    #[error("request not found: {0}")]
    RequestNotFound(RequestId),

    /// A request with the same id is already pending or active.
    #[error("duplicate request id: {0}")]
    DuplicateRequest(RequestId),

    /// The state machine refused the transition.
    #[error("invalid transition for request {request}: {from} -> {to}")]
    InvalidTransition {
        request: RequestId,
        from: RequestState,
        to: RequestState,
    },

    /// A stored zone reference no longer resolves.
    #[error("zone not found: {0}")]
    ZoneNotFound(ZoneId),

    /// A stored area reference no longer resolves.
    #[error("area not found: {0}")]
    AreaNotFound(AreaId),

    /// A stored slot reference no longer resolves.
    #[error("slot not found: {0}")]
    SlotNotFound(SlotId),

    /// The slot refused the reserve/occupy primitive.
    #[error("slot unavailable: {0}")]
    SlotUnavailable(SlotId),

    /// An active request carries no placement.
    #[error("request {0} has no slot placement")]
    NotPlaced(RequestId),
}

impl AllocationError {
    /// Whether this is one of the not-found variants
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RequestNotFound(_)
                | Self::ZoneNotFound(_)
                | Self::AreaNotFound(_)
                | Self::SlotNotFound(_)
        )
    }
}

/// Convenience result type for allocation operations.
pub type AllocationResult<T> = Result<T, AllocationError>;
