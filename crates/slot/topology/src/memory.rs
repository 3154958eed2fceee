//! In-memory topology, ordered by creation at every level.

use serde::{Deserialize, Serialize};
use slot_types::{AllocationError, AllocationResult, AreaId, SlotId, SlotPath, SlotType, ZoneId};

use crate::{Area, Slot, Topology, TopologyError, TopologyResult, Zone};

/// Zones held in a `Vec` so iteration order is creation order
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct InMemoryTopology {
    zones: Vec<Zone>,
}

impl InMemoryTopology {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Construction ─────────────────────────────────────────────────

    pub fn add_zone(&mut self, zone: Zone) -> TopologyResult<()> {
        if self.zone(&zone.id).is_some() {
            return Err(TopologyError::DuplicateZone(zone.id));
        }
        tracing::debug!(zone = %zone.id, "Zone added");
        self.zones.push(zone);
        Ok(())
    }

    pub fn create_zone(
        &mut self,
        zone_id: ZoneId,
        name: impl Into<String>,
    ) -> TopologyResult<&mut Zone> {
        self.add_zone(Zone::new(zone_id.clone(), name))?;
        self.zone_mut(&zone_id)
            .ok_or(TopologyError::ZoneNotFound(zone_id))
    }

    /// Create an area with `slot_count` slots of one type inside a zone.
    pub fn create_area(
        &mut self,
        zone_id: &ZoneId,
        area_id: AreaId,
        name: impl Into<String>,
        floor: i32,
        slot_count: usize,
        slot_type: SlotType,
    ) -> TopologyResult<Vec<SlotId>> {
        let zone = self
            .zone_mut(zone_id)
            .ok_or_else(|| TopologyError::ZoneNotFound(zone_id.clone()))?;
        let mut area = Area::new(area_id, name, floor);
        let slots = area.add_slots(slot_count, slot_type);
        tracing::debug!(zone = %zone_id, area = %area.id, slots = slots.len(), "Area added");
        zone.add_area(area)?;
        Ok(slots)
    }

    /// Make two zones adjacent in both directions.
    pub fn link_zones(&mut self, a: &ZoneId, b: &ZoneId) -> TopologyResult<()> {
        for id in [a, b] {
            if self.zone(id).is_none() {
                return Err(TopologyError::ZoneNotFound(id.clone()));
            }
        }
        if let Some(zone) = self.zone_mut(a) {
            zone.add_adjacent(b.clone());
        }
        if let Some(zone) = self.zone_mut(b) {
            zone.add_adjacent(a.clone());
        }
        Ok(())
    }

    /// Remove a zone and every adjacency edge pointing at it.
    /// Fails while any slot in the zone is reserved or occupied.
    pub fn remove_zone(&mut self, zone_id: &ZoneId) -> TopologyResult<Zone> {
        let pos = self
            .zones
            .iter()
            .position(|z| &z.id == zone_id)
            .ok_or_else(|| TopologyError::ZoneNotFound(zone_id.clone()))?;
        if self.zones[pos].is_in_use() {
            return Err(TopologyError::InUse(zone_id.to_string()));
        }
        let zone = self.zones.remove(pos);
        for other in &mut self.zones {
            other.remove_adjacent(zone_id);
        }
        tracing::debug!(zone = %zone_id, "Zone removed");
        Ok(zone)
    }

    pub fn remove_area(&mut self, zone_id: &ZoneId, area_id: &AreaId) -> TopologyResult<Area> {
        self.zone_mut(zone_id)
            .ok_or_else(|| TopologyError::ZoneNotFound(zone_id.clone()))?
            .remove_area(area_id)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn zone(&self, zone_id: &ZoneId) -> Option<&Zone> {
        self.zones.iter().find(|z| &z.id == zone_id)
    }

    pub fn zone_mut(&mut self, zone_id: &ZoneId) -> Option<&mut Zone> {
        self.zones.iter_mut().find(|z| &z.id == zone_id)
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn area(&self, zone_id: &ZoneId, area_id: &AreaId) -> Option<&Area> {
        self.zone(zone_id)?.area(area_id)
    }

    pub fn slot(&self, path: &SlotPath) -> Option<&Slot> {
        self.resolve(path).ok()
    }

    pub fn totals(&self) -> TopologyTotals {
        let mut totals = TopologyTotals {
            zones: self.zones.len(),
            ..Default::default()
        };
        for zone in &self.zones {
            totals.areas += zone.areas.len();
            totals.slots += zone.total_slots();
            totals.available += zone.available_slots();
            totals.reserved += zone.reserved_slots();
            totals.occupied += zone.occupied_slots();
        }
        totals
    }
}

impl Topology for InMemoryTopology {
    fn zone_ids(&self) -> Vec<ZoneId> {
        self.zones.iter().map(|z| z.id.clone()).collect()
    }

    fn has_zone(&self, zone_id: &ZoneId) -> bool {
        self.zone(zone_id).is_some()
    }

    fn adjacent_zones(&self, zone_id: &ZoneId) -> Vec<ZoneId> {
        self.zone(zone_id)
            .map(|z| z.adjacent.clone())
            .unwrap_or_default()
    }

    fn find_first_available(
        &self,
        zone_id: &ZoneId,
        slot_type: Option<SlotType>,
    ) -> Option<SlotPath> {
        self.zone(zone_id)?
            .first_available(slot_type)
            .map(Slot::path)
    }

    fn resolve(&self, path: &SlotPath) -> AllocationResult<&Slot> {
        self.zone(&path.zone_id)
            .ok_or_else(|| AllocationError::ZoneNotFound(path.zone_id.clone()))?
            .area(&path.area_id)
            .ok_or_else(|| AllocationError::AreaNotFound(path.area_id.clone()))?
            .slot(&path.slot_id)
            .ok_or_else(|| AllocationError::SlotNotFound(path.slot_id.clone()))
    }

    fn resolve_mut(&mut self, path: &SlotPath) -> AllocationResult<&mut Slot> {
        self.zone_mut(&path.zone_id)
            .ok_or_else(|| AllocationError::ZoneNotFound(path.zone_id.clone()))?
            .area_mut(&path.area_id)
            .ok_or_else(|| AllocationError::AreaNotFound(path.area_id.clone()))?
            .slot_mut(&path.slot_id)
            .ok_or_else(|| AllocationError::SlotNotFound(path.slot_id.clone()))
    }
}

/// Slot counts across the whole topology
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyTotals {
    pub zones: usize,
    pub areas: usize,
    pub slots: usize,
    pub available: usize,
    pub reserved: usize,
    pub occupied: usize,
}

impl TopologyTotals {
    /// Occupied share of all slots, in percent
    pub fn utilization(&self) -> f64 {
        if self.slots == 0 {
            return 0.0;
        }
        self.occupied as f64 / self.slots as f64 * 100.0
    }
}
