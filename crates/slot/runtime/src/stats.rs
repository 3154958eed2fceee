//! Aggregate statistics for reporting.

use chrono::{DateTime, Utc};
use serde::Serialize;
use slot_engine::AllocationStats;
use slot_rollback::RollbackStats;
use slot_topology::{TopologyTotals, Zone};
use slot_types::ZoneId;

/// System-wide numbers
#[derive(Clone, Debug, Serialize)]
pub struct SystemStats {
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub topology: TopologyTotals,
    /// Occupied share of all slots, in percent
    pub utilization: f64,
    pub requests_served: u64,
    pub allocation: AllocationStats,
    pub rollback: RollbackStats,
}

/// Per-zone numbers
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ZoneStats {
    pub zone_id: ZoneId,
    pub name: String,
    pub areas: usize,
    pub total_slots: usize,
    pub available_slots: usize,
    pub occupied_slots: usize,
    pub utilization: f64,
    pub adjacent: Vec<ZoneId>,
}

impl From<&Zone> for ZoneStats {
    fn from(zone: &Zone) -> Self {
        Self {
            zone_id: zone.id.clone(),
            name: zone.name.clone(),
            areas: zone.areas.len(),
            total_slots: zone.total_slots(),
            available_slots: zone.available_slots(),
            occupied_slots: zone.occupied_slots(),
            utilization: zone.utilization(),
            adjacent: zone.adjacent.clone(),
        }
    }
}
