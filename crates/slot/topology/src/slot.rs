//! A single allocatable slot and its reserve/occupy/release primitives.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use slot_types::{AreaId, RequestId, RequesterRef, SlotId, SlotPath, SlotType, ZoneId};

/// Operational status of a slot
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    #[default]
    Available,
    Reserved,
    Occupied,
    Maintenance,
    OutOfService,
}

/// The smallest allocatable unit
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Slot {
    pub id: SlotId,
    pub slot_type: SlotType,
    pub status: SlotStatus,
    pub zone_id: ZoneId,
    pub area_id: AreaId,
    /// Who is in the slot right now
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupant: Option<RequesterRef>,
    /// The request holding the slot (reserved or occupied)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reserved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occupied_at: Option<DateTime<Utc>>,
}

impl Slot {
    pub fn new(id: SlotId, slot_type: SlotType) -> Self {
        Self {
            id,
            slot_type,
            status: SlotStatus::Available,
            zone_id: ZoneId::new(""),
            area_id: AreaId::new(""),
            occupant: None,
            request_id: None,
            reserved_at: None,
            occupied_at: None,
        }
    }

    pub fn path(&self) -> SlotPath {
        SlotPath::new(self.zone_id.clone(), self.area_id.clone(), self.id.clone())
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn is_reserved(&self) -> bool {
        self.status == SlotStatus::Reserved
    }

    pub fn is_occupied(&self) -> bool {
        self.status == SlotStatus::Occupied
    }

    /// Reserved or occupied
    pub fn is_held(&self) -> bool {
        self.is_reserved() || self.is_occupied()
    }

    /// Reserve the slot for a request. Only an available slot can be reserved.
    pub fn reserve(&mut self, request_id: RequestId) -> bool {
        if !self.is_available() {
            return false;
        }
        self.status = SlotStatus::Reserved;
        self.request_id = Some(request_id);
        self.reserved_at = Some(Utc::now());
        true
    }

    /// Put an occupant in the slot.
    ///
    /// Succeeds on an available slot, or on a reserved slot when the
    /// reservation belongs to `request_id` (or no request is given).
    pub fn occupy(&mut self, occupant: RequesterRef, request_id: Option<RequestId>) -> bool {
        match self.status {
            SlotStatus::Available => {}
            SlotStatus::Reserved => {
                if let (Some(held), Some(req)) = (&self.request_id, &request_id) {
                    if held != req {
                        return false;
                    }
                }
            }
            _ => return false,
        }
        self.status = SlotStatus::Occupied;
        self.occupant = Some(occupant);
        if request_id.is_some() {
            self.request_id = request_id;
        }
        self.occupied_at = Some(Utc::now());
        true
    }

    /// Free the slot and report who was in it and for how long.
    pub fn release(&mut self) -> SlotRelease {
        let released_at = Utc::now();
        let info = SlotRelease {
            slot_id: self.id.clone(),
            occupant: self.occupant.take(),
            request_id: self.request_id.take(),
            occupied_at: self.occupied_at,
            released_at,
            duration: self.occupied_at.map(|at| released_at - at),
        };
        self.status = SlotStatus::Available;
        self.occupied_at = None;
        self.reserved_at = None;
        info
    }

    /// Drop a reservation that was never turned into occupancy.
    pub fn cancel_reservation(&mut self) -> bool {
        if !self.is_reserved() {
            return false;
        }
        self.status = SlotStatus::Available;
        self.request_id = None;
        self.reserved_at = None;
        true
    }

    /// Take a free slot out of rotation
    pub fn set_maintenance(&mut self) -> bool {
        self.take_out_of_rotation(SlotStatus::Maintenance)
    }

    pub fn set_out_of_service(&mut self) -> bool {
        self.take_out_of_rotation(SlotStatus::OutOfService)
    }

    /// Return a maintenance/out-of-service slot to rotation
    pub fn restore_service(&mut self) -> bool {
        if matches!(
            self.status,
            SlotStatus::Maintenance | SlotStatus::OutOfService
        ) {
            self.status = SlotStatus::Available;
            true
        } else {
            false
        }
    }

    /// How long the current occupant has been in the slot
    pub fn occupancy_duration(&self) -> Option<chrono::Duration> {
        self.occupied_at.map(|at| Utc::now() - at)
    }

    fn take_out_of_rotation(&mut self, status: SlotStatus) -> bool {
        if self.is_held() {
            return false;
        }
        self.status = status;
        true
    }
}

/// What [`Slot::release`] hands back
#[derive(Clone, Debug)]
pub struct SlotRelease {
    pub slot_id: SlotId,
    pub occupant: Option<RequesterRef>,
    pub request_id: Option<RequestId>,
    pub occupied_at: Option<DateTime<Utc>>,
    pub released_at: DateTime<Utc>,
    /// `None` when the slot was never occupied
    pub duration: Option<chrono::Duration>,
}
