//! Live state shared by the facade and the reversal handlers.

use slot_engine::AllocationEngine;
use slot_topology::InMemoryTopology;

/// Topology plus engine; the context every reversal handler mutates.
#[derive(Clone, Debug, Default)]
pub struct SystemState {
    pub topology: InMemoryTopology,
    pub engine: AllocationEngine,
    /// Requests that reached RELEASED, directly or by reversing an occupy
    pub requests_served: u64,
}

impl SystemState {
    pub fn new() -> Self {
        Self::default()
    }
}
