//! Identifiers for requests, requesters, and the zone/area/slot hierarchy.

use serde::{Deserialize, Serialize};

// ── Request Identifier ───────────────────────────────────────────────

/// Unique identifier for an allocation request
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// First eight characters
    pub fn short(&self) -> &str {
        self.0
            .char_indices()
            .nth(8)
            .map_or(&self.0[..], |(i, _)| &self.0[..i])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference to whoever asked for the slot (a vehicle, tenant, job...).
///
/// The engine never interprets it; it is handed to the slot on occupancy.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequesterRef(pub String);

impl RequesterRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequesterRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequesterRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for RequesterRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ── Topology Identifiers ─────────────────────────────────────────────

/// Identifier of a zone
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ZoneId(pub String);

impl ZoneId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ZoneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an area inside a zone
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AreaId(pub String);

impl AreaId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AreaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a single slot
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub String);

impl SlotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Slot Path ────────────────────────────────────────────────────────

/// Fully-qualified location of a slot: zone → area → slot.
///
/// Requests store the path they were placed on; every later operation
/// re-resolves it through the topology.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPath {
    pub zone_id: ZoneId,
    pub area_id: AreaId,
    pub slot_id: SlotId,
}

impl SlotPath {
    pub fn new(zone_id: ZoneId, area_id: AreaId, slot_id: SlotId) -> Self {
        Self {
            zone_id,
            area_id,
            slot_id,
        }
    }
}

impl std::fmt::Display for SlotPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.zone_id, self.area_id, self.slot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_request_ids_are_unique() {
        let a = RequestId::generate();
        let b = RequestId::generate();
        assert_ne!(a, b);
        assert_eq!(a.short().len(), 8);
    }

    #[test]
    fn short_id_handles_short_input() {
        let id = RequestId::new("R1");
        assert_eq!(id.short(), "R1");
    }

    #[test]
    fn short_id_counts_characters() {
        let id = RequestId::new("aéééééééééé");
        assert_eq!(id.short(), "aééééééé");
        assert_eq!(id.short().chars().count(), 8);
    }

    #[test]
    fn slot_path_display() {
        let path = SlotPath::new(ZoneId::new("Z1"), AreaId::new("A1"), SlotId::new("A1-S001"));
        assert_eq!(path.to_string(), "Z1/A1/A1-S001");
    }
}
