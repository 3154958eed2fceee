//! Results returned by the allocation engine.

use chrono::{DateTime, Utc};
use slot_topology::SlotRelease;
use slot_types::{Request, RequestId, SlotPath};

/// Result of one placement attempt (or of queueing a request)
#[derive(Clone, Debug)]
pub struct AllocationOutcome {
    pub success: bool,
    pub request_id: RequestId,
    /// The request as it stood once the attempt finished
    pub request: Request,
    /// Where the request was placed; `None` on failure or when only queued
    pub placement: Option<SlotPath>,
    /// Placed outside the preferred zone
    pub cross_zone: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AllocationOutcome {
    pub(crate) fn placed(request: Request, path: SlotPath, cross_zone: bool) -> Self {
        let message = format!("Allocated slot {} in zone {}", path.slot_id, path.zone_id);
        Self {
            success: true,
            request_id: request.id().clone(),
            request,
            placement: Some(path),
            cross_zone,
            message,
            timestamp: Utc::now(),
        }
    }

    pub(crate) fn rejected(request: Request, message: String) -> Self {
        Self {
            success: false,
            request_id: request.id().clone(),
            request,
            placement: None,
            cross_zone: false,
            message,
            timestamp: Utc::now(),
        }
    }

    /// Accepted into the pending queue without a placement attempt
    pub fn queued(request: Request) -> Self {
        Self {
            success: true,
            request_id: request.id().clone(),
            request,
            placement: None,
            cross_zone: false,
            message: "Request queued for processing".into(),
            timestamp: Utc::now(),
        }
    }

    pub fn zone_id(&self) -> Option<&slot_types::ZoneId> {
        self.placement.as_ref().map(|p| &p.zone_id)
    }
}

/// What the engine hands back after a release
#[derive(Clone, Debug)]
pub struct ReleaseReceipt {
    /// The request, now RELEASED and archived
    pub request: Request,
    /// Occupancy details reported by the slot
    pub slot: SlotRelease,
}

impl ReleaseReceipt {
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.slot.duration
    }
}
