//! The topology view consumed by the allocation engine.

use slot_types::{AllocationResult, SlotPath, SlotType, ZoneId};

use crate::Slot;

/// Read/write view over a resource topology.
///
/// Implementations must return zones, adjacency and slots in a stable
/// order; placement is first-fit over that order.
pub trait Topology {
    /// All zone ids in iteration order.
    fn zone_ids(&self) -> Vec<ZoneId>;

    fn has_zone(&self, zone_id: &ZoneId) -> bool;

    /// Zones adjacent to `zone_id`, in adjacency order. Empty for unknown zones.
    fn adjacent_zones(&self, zone_id: &ZoneId) -> Vec<ZoneId>;

    /// Path of the first available slot in a zone, optionally of one type.
    fn find_first_available(
        &self,
        zone_id: &ZoneId,
        slot_type: Option<SlotType>,
    ) -> Option<SlotPath>;

    /// Resolve a stored path. Fails with the not-found error of the first
    /// level (zone, area, slot) that no longer exists.
    fn resolve(&self, path: &SlotPath) -> AllocationResult<&Slot>;

    fn resolve_mut(&mut self, path: &SlotPath) -> AllocationResult<&mut Slot>;
}
