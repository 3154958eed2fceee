//! Areas: named, ordered groups of slots inside a zone.

use serde::{Deserialize, Serialize};
use slot_types::{AreaId, SlotId, SlotType, ZoneId};

use crate::Slot;

/// A named grouping of slots (a floor section, a row, a bay...)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Area {
    pub id: AreaId,
    pub name: String,
    pub zone_id: ZoneId,
    pub floor: i32,
    /// Slots in creation order
    pub slots: Vec<Slot>,
}

impl Area {
    pub fn new(id: AreaId, name: impl Into<String>, floor: i32) -> Self {
        Self {
            id,
            name: name.into(),
            zone_id: ZoneId::new(""),
            floor,
            slots: Vec::new(),
        }
    }

    /// Append a slot, stamping it with this area's zone and area ids.
    pub fn add_slot(&mut self, mut slot: Slot) {
        slot.area_id = self.id.clone();
        slot.zone_id = self.zone_id.clone();
        self.slots.push(slot);
    }

    /// Append `count` slots named `{area}-S001`, `{area}-S002`, ...
    ///
    /// Numbering continues after the highest generated suffix still
    /// present, so ids never repeat within the area.
    pub fn add_slots(&mut self, count: usize, slot_type: SlotType) -> Vec<SlotId> {
        let start = self.highest_suffix() + 1;
        (start..start + count)
            .map(|n| {
                let id = SlotId::new(format!("{}-S{:03}", self.id, n));
                self.add_slot(Slot::new(id.clone(), slot_type));
                id
            })
            .collect()
    }

    fn highest_suffix(&self) -> usize {
        let prefix = format!("{}-S", self.id);
        self.slots
            .iter()
            .filter_map(|s| s.id.as_str().strip_prefix(&prefix)?.parse::<usize>().ok())
            .max()
            .unwrap_or(0)
    }

    pub fn remove_slot(&mut self, slot_id: &SlotId) -> Option<Slot> {
        let pos = self.slots.iter().position(|s| &s.id == slot_id)?;
        Some(self.slots.remove(pos))
    }

    pub fn slot(&self, slot_id: &SlotId) -> Option<&Slot> {
        self.slots.iter().find(|s| &s.id == slot_id)
    }

    pub fn slot_mut(&mut self, slot_id: &SlotId) -> Option<&mut Slot> {
        self.slots.iter_mut().find(|s| &s.id == slot_id)
    }

    /// First available slot in creation order, optionally of one type
    pub fn first_available(&self, slot_type: Option<SlotType>) -> Option<&Slot> {
        self.slots
            .iter()
            .find(|s| s.is_available() && slot_type.map_or(true, |t| s.slot_type == t))
    }

    pub fn total_slots(&self) -> usize {
        self.slots.len()
    }

    pub fn available_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_available()).count()
    }

    pub fn occupied_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_occupied()).count()
    }

    pub fn reserved_slots(&self) -> usize {
        self.slots.iter().filter(|s| s.is_reserved()).count()
    }

    /// Whether any slot is reserved or occupied
    pub fn is_in_use(&self) -> bool {
        self.slots.iter().any(|s| s.is_held())
    }

    pub(crate) fn set_zone(&mut self, zone_id: &ZoneId) {
        self.zone_id = zone_id.clone();
        for slot in &mut self.slots {
            slot.zone_id = zone_id.clone();
        }
    }
}
