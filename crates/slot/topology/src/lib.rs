//! Resource topology: zones contain areas, areas contain typed slots.
//!
//! The allocation engine never owns the topology. It receives a
//! `&mut impl Topology` on every call and works through the trait only:
//! enumerate zones, look up adjacency, find the first free slot, and
//! resolve a [`SlotPath`](slot_types::SlotPath) to a [`Slot`] so the
//! reserve/occupy/release primitives can be applied.
//!
//! [`InMemoryTopology`] is the reference implementation. Iteration order is
//! creation order at every level (zones, areas, slots, adjacency), which is
//! what keeps first-fit placement reproducible.

#![deny(unsafe_code)]

pub mod area;
pub mod error;
pub mod memory;
pub mod slot;
pub mod view;
pub mod zone;

pub use area::Area;
pub use error::{TopologyError, TopologyResult};
pub use memory::{InMemoryTopology, TopologyTotals};
pub use slot::{Slot, SlotRelease, SlotStatus};
pub use view::Topology;
pub use zone::Zone;
