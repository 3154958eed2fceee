//! Domain types for slot allocation.
//!
//! A [`Request`] asks for exactly one slot. It carries a priority, an
//! optional zone preference, and a lifecycle that can only move along the
//! edges of the request state machine:
//!
//! ```text
//! REQUESTED ──▶ ALLOCATED ──▶ OCCUPIED ──▶ RELEASED
//!     │             │
//!     ├──▶ CANCELLED ◀┤
//!     ├──▶ EXPIRED   ◀┘
//!     └──▶ REJECTED
//! ```
//!
//! Every transition is appended to the request's history with a reason.
//! Illegal transitions return [`AllocationError::InvalidTransition`] and
//! leave the request untouched.

#![deny(unsafe_code)]

pub mod error;
pub mod ids;
pub mod priority;
pub mod request;
pub mod slot_type;
pub mod state;

pub use error::{AllocationError, AllocationResult};
pub use ids::{AreaId, RequestId, RequesterRef, SlotId, SlotPath, ZoneId};
pub use priority::RequestPriority;
pub use request::{Request, TimelineEntry};
pub use slot_type::SlotType;
pub use state::{RequestState, StateTransition};
