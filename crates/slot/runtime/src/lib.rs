//! Slot allocation runtime.
//!
//! [`AllocationSystem`] owns an in-memory topology, the allocation engine
//! and a rollback manager with a reversal handler for every operation type.
//! Each mutating call is recorded with before/after snapshots so the most
//! recent operations can be undone.
//!
//! ```rust
//! use slot_runtime::{AllocationSystem, SystemConfig};
//! use slot_types::*;
//!
//! let mut system = AllocationSystem::new(SystemConfig::default()).unwrap();
//! system.create_zone(ZoneId::new("Z1"), "North", "").unwrap();
//! system
//!     .create_area(&ZoneId::new("Z1"), AreaId::new("A1"), "Level 1", 1, 2, SlotType::Regular)
//!     .unwrap();
//!
//! let outcome = system
//!     .submit_request(Request::new("V-1").with_preferred_zone(ZoneId::new("Z1")))
//!     .unwrap();
//! assert!(outcome.success);
//!
//! // undo the allocation: the request is cancelled and the slot freed
//! system.rollback_last().unwrap();
//! assert_eq!(system.lookup(&outcome.request_id).unwrap().state(), RequestState::Cancelled);
//! assert_eq!(system.topology().totals().available, 2);
//! ```

#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;
pub mod stats;
pub mod system;
pub mod telemetry;

pub use config::SystemConfig;
pub use error::{SystemError, SystemResult};
pub use state::SystemState;
pub use stats::{SystemStats, ZoneStats};
pub use system::AllocationSystem;
pub use telemetry::init_tracing;
