//! Allocation engine for typed slots.
//!
//! The [`AllocationEngine`] owns three collections:
//!
//! - the pending [`PriorityRequestQueue`]
//! - the active table (requests currently ALLOCATED or OCCUPIED)
//! - the completed archive (append-only, in completion order)
//!
//! Placement is first-fit over the topology's own iteration order:
//! preferred zone, then its neighbours (when fallback is allowed), then
//! every zone. Exhaustion is a normal outcome: the request is REJECTED and
//! an [`AllocationOutcome`] with `success == false` is returned.
//!
//! # Example
//!
//! ```rust
//! use slot_engine::AllocationEngine;
//! use slot_topology::InMemoryTopology;
//! use slot_types::*;
//!
//! let mut topology = InMemoryTopology::new();
//! topology.create_zone(ZoneId::new("Z1"), "North").unwrap();
//! topology
//!     .create_area(&ZoneId::new("Z1"), AreaId::new("A1"), "Level 1", 1, 1, SlotType::Regular)
//!     .unwrap();
//!
//! let mut engine = AllocationEngine::new();
//! let request = Request::new("V-1").with_preferred_zone(ZoneId::new("Z1"));
//! let outcome = engine.allocate(request, &mut topology).unwrap();
//!
//! assert!(outcome.success);
//! assert_eq!(outcome.placement.unwrap().slot_id, SlotId::new("A1-S001"));
//! ```

#![deny(unsafe_code)]

pub mod engine;
pub mod outcome;
pub mod queue;

pub use engine::{AllocationEngine, AllocationStats};
pub use outcome::{AllocationOutcome, ReleaseReceipt};
pub use queue::PriorityRequestQueue;
