//! Request lifecycle states and the transition table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestState {
    /// Submitted, waiting for placement
    #[default]
    Requested,
    /// A slot has been reserved for the request
    Allocated,
    /// The requester is using the slot
    Occupied,
    /// The slot was given back
    Released,
    Cancelled,
    Expired,
    /// No slot could be found
    Rejected,
}

impl RequestState {
    /// States reachable from this one in a single step
    pub fn allowed_transitions(&self) -> &'static [RequestState] {
        use RequestState::*;
        match self {
            Requested => &[Allocated, Cancelled, Rejected, Expired],
            Allocated => &[Occupied, Cancelled, Expired],
            Occupied => &[Released],
            Released | Cancelled | Expired | Rejected => &[],
        }
    }

    pub fn can_transition_to(&self, next: RequestState) -> bool {
        self.allowed_transitions().contains(&next)
    }

    pub fn is_terminal(&self) -> bool {
        self.allowed_transitions().is_empty()
    }

    /// ALLOCATED or OCCUPIED: the request holds a slot
    pub fn holds_slot(&self) -> bool {
        matches!(self, Self::Allocated | Self::Occupied)
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Requested => "requested",
            Self::Allocated => "allocated",
            Self::Occupied => "occupied",
            Self::Released => "released",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// One step in a request's history. Never modified once recorded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub from: RequestState,
    pub to: RequestState,
    pub at: DateTime<Utc>,
    pub reason: String,
}
