//! Zones: ordered groups of areas plus adjacency to other zones.

use serde::{Deserialize, Serialize};
use slot_types::{AreaId, SlotType, ZoneId};

use crate::{Area, Slot, TopologyError, TopologyResult};

/// A named grouping of areas, linked to neighbouring zones for fallback
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Areas in creation order
    pub areas: Vec<Area>,
    /// Neighbouring zones, in the order they were linked, without duplicates
    pub adjacent: Vec<ZoneId>,
}

impl Zone {
    pub fn new(id: ZoneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: String::new(),
            areas: Vec::new(),
            adjacent: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn add_area(&mut self, mut area: Area) -> TopologyResult<()> {
        if self.area(&area.id).is_some() {
            return Err(TopologyError::DuplicateArea(area.id));
        }
        area.set_zone(&self.id);
        self.areas.push(area);
        Ok(())
    }

    /// Remove an area. Fails while any of its slots is reserved or occupied.
    pub fn remove_area(&mut self, area_id: &AreaId) -> TopologyResult<Area> {
        let pos = self
            .areas
            .iter()
            .position(|a| &a.id == area_id)
            .ok_or_else(|| TopologyError::AreaNotFound(area_id.clone()))?;
        if self.areas[pos].is_in_use() {
            return Err(TopologyError::InUse(area_id.to_string()));
        }
        Ok(self.areas.remove(pos))
    }

    pub fn area(&self, area_id: &AreaId) -> Option<&Area> {
        self.areas.iter().find(|a| &a.id == area_id)
    }

    pub fn area_mut(&mut self, area_id: &AreaId) -> Option<&mut Area> {
        self.areas.iter_mut().find(|a| &a.id == area_id)
    }

    /// Link a neighbour. Linking the same zone twice is a no-op.
    pub fn add_adjacent(&mut self, zone_id: ZoneId) -> bool {
        if zone_id == self.id || self.adjacent.contains(&zone_id) {
            return false;
        }
        self.adjacent.push(zone_id);
        true
    }

    pub fn remove_adjacent(&mut self, zone_id: &ZoneId) -> bool {
        let before = self.adjacent.len();
        self.adjacent.retain(|z| z != zone_id);
        self.adjacent.len() != before
    }

    pub fn is_adjacent(&self, zone_id: &ZoneId) -> bool {
        self.adjacent.contains(zone_id)
    }

    /// First available slot across areas, both in creation order
    pub fn first_available(&self, slot_type: Option<SlotType>) -> Option<&Slot> {
        self.areas.iter().find_map(|a| a.first_available(slot_type))
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.areas.iter().flat_map(|a| a.slots.iter())
    }

    pub fn total_slots(&self) -> usize {
        self.areas.iter().map(Area::total_slots).sum()
    }

    pub fn available_slots(&self) -> usize {
        self.areas.iter().map(Area::available_slots).sum()
    }

    pub fn occupied_slots(&self) -> usize {
        self.areas.iter().map(Area::occupied_slots).sum()
    }

    pub fn reserved_slots(&self) -> usize {
        self.areas.iter().map(Area::reserved_slots).sum()
    }

    pub fn is_in_use(&self) -> bool {
        self.areas.iter().any(Area::is_in_use)
    }

    /// Occupied share of all slots, in percent
    pub fn utilization(&self) -> f64 {
        let total = self.total_slots();
        if total == 0 {
            return 0.0;
        }
        self.occupied_slots() as f64 / total as f64 * 100.0
    }
}
