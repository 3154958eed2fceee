//! Bounded undo log for slot allocation.
//!
//! A [`RollbackManager`] keeps the most recent operations (oldest evicted
//! first) with before/after [`Snapshot`]s and reverses the newest `k` of
//! them through handlers registered per [`OperationType`]. The manager is
//! generic over the context its handlers mutate; the runtime supplies the
//! live system state.
//!
//! ```rust
//! use slot_rollback::*;
//!
//! let mut manager: RollbackManager<Vec<String>> = RollbackManager::new(10)
//!     .with_handler(OperationType::SlotReserve, |op: &Operation, undone: &mut Vec<String>| {
//!         undone.push(op.entity_id().to_string());
//!         Ok(())
//!     });
//!
//! manager.record(
//!     OperationType::SlotReserve,
//!     EntityRef::slot("A1-S001"),
//!     Snapshot::empty(),
//!     Snapshot::empty(),
//!     Vec::new(),
//! );
//!
//! let mut undone = Vec::new();
//! let report = manager.rollback_last(&mut undone).unwrap();
//! assert!(report.success());
//! assert_eq!(undone, vec!["A1-S001"]);
//! ```

#![deny(unsafe_code)]

pub mod error;
pub mod log;
pub mod manager;
pub mod operation;
pub mod report;

pub use error::{RollbackError, RollbackResult};
pub use log::OperationLog;
pub use manager::{ReversalHandler, RollbackManager, RollbackStats};
pub use operation::{EntityKind, EntityRef, Operation, OperationId, OperationType, Snapshot};
pub use report::{RollbackFailure, RollbackReport};
