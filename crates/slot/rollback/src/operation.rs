//! Operation records and their value snapshots.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::RollbackResult;

// ── Operation type ───────────────────────────────────────────────────

/// Kind of state mutation an operation records. Reversal handlers are
/// registered per type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationType {
    SlotReserve,
    SlotOccupy,
    SlotRelease,
    RequestCreate,
    RequestAllocate,
    RequestOccupy,
    RequestRelease,
    RequestCancel,
    RequestExpire,
    ZoneCreate,
    AreaCreate,
}

impl OperationType {
    pub const ALL: [OperationType; 11] = [
        Self::SlotReserve,
        Self::SlotOccupy,
        Self::SlotRelease,
        Self::RequestCreate,
        Self::RequestAllocate,
        Self::RequestOccupy,
        Self::RequestRelease,
        Self::RequestCancel,
        Self::RequestExpire,
        Self::ZoneCreate,
        Self::AreaCreate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SlotReserve => "slot_reserve",
            Self::SlotOccupy => "slot_occupy",
            Self::SlotRelease => "slot_release",
            Self::RequestCreate => "request_create",
            Self::RequestAllocate => "request_allocate",
            Self::RequestOccupy => "request_occupy",
            Self::RequestRelease => "request_release",
            Self::RequestCancel => "request_cancel",
            Self::RequestExpire => "request_expire",
            Self::ZoneCreate => "zone_create",
            Self::AreaCreate => "area_create",
        }
    }
}

impl std::fmt::Display for OperationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Entity references ────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Request,
    Slot,
    Area,
    Zone,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request => write!(f, "request"),
            Self::Slot => write!(f, "slot"),
            Self::Area => write!(f, "area"),
            Self::Zone => write!(f, "zone"),
        }
    }
}

/// A typed pointer at some entity, by id
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityRef {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityRef {
    pub fn new(kind: EntityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    pub fn request(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Request, id)
    }

    pub fn slot(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Slot, id)
    }

    pub fn area(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Area, id)
    }

    pub fn zone(id: impl Into<String>) -> Self {
        Self::new(EntityKind::Zone, id)
    }
}

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// ── Operation id ─────────────────────────────────────────────────────

/// Sequence number assigned by the manager; later operations compare greater.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OperationId(pub u64);

impl std::fmt::Display for OperationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OP-{:06}", self.0)
    }
}

// ── Snapshot ─────────────────────────────────────────────────────────

/// Owned copy of an entity's serialized state.
///
/// The tree shares nothing with the live entity, so later mutation of the
/// entity cannot change a recorded snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(serde_json::Value);

impl Snapshot {
    pub fn capture<T: Serialize + ?Sized>(value: &T) -> RollbackResult<Self> {
        Ok(Self(serde_json::to_value(value)?))
    }

    pub fn empty() -> Self {
        Self(serde_json::Value::Null)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_null()
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.0.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field)?.as_str()
    }

    /// Rebuild a typed value from the snapshot.
    pub fn decode<T: DeserializeOwned>(&self) -> RollbackResult<T> {
        Ok(serde_json::from_value(self.0.clone())?)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<serde_json::Value> for Snapshot {
    fn from(value: serde_json::Value) -> Self {
        Self(value)
    }
}

// ── Operation ────────────────────────────────────────────────────────

/// One recorded state mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Operation {
    id: OperationId,
    op_type: OperationType,
    entity: EntityRef,
    before: Snapshot,
    after: Snapshot,
    related: Vec<EntityRef>,
    timestamp: DateTime<Utc>,
    rolled_back: bool,
}

impl Operation {
    pub fn new(
        id: OperationId,
        op_type: OperationType,
        entity: EntityRef,
        before: Snapshot,
        after: Snapshot,
        related: Vec<EntityRef>,
    ) -> Self {
        Self {
            id,
            op_type,
            entity,
            before,
            after,
            related,
            timestamp: Utc::now(),
            rolled_back: false,
        }
    }

    pub fn id(&self) -> OperationId {
        self.id
    }

    pub fn op_type(&self) -> OperationType {
        self.op_type
    }

    pub fn entity(&self) -> &EntityRef {
        &self.entity
    }

    pub fn entity_id(&self) -> &str {
        &self.entity.id
    }

    pub fn before(&self) -> &Snapshot {
        &self.before
    }

    pub fn after(&self) -> &Snapshot {
        &self.after
    }

    pub fn related(&self) -> &[EntityRef] {
        &self.related
    }

    /// Id of the first related entity of `kind`
    pub fn related_id(&self, kind: EntityKind) -> Option<&str> {
        self.related
            .iter()
            .find(|r| r.kind == kind)
            .map(|r| r.id.as_str())
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_rolled_back(&self) -> bool {
        self.rolled_back
    }

    pub(crate) fn mark_rolled_back(&mut self) {
        self.rolled_back = true;
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.id, self.op_type, self.entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Gate {
        id: String,
        open: bool,
    }

    #[test]
    fn snapshot_is_independent_of_source() {
        let mut gate = Gate {
            id: "G1".into(),
            open: false,
        };
        let snap = Snapshot::capture(&gate).unwrap();
        gate.open = true;

        assert_eq!(snap.get("open"), Some(&json!(false)));
        assert_eq!(snap.get_str("id"), Some("G1"));
        let restored: Gate = snap.decode().unwrap();
        assert!(!restored.open);
    }

    #[test]
    fn empty_snapshot() {
        let snap = Snapshot::empty();
        assert!(snap.is_empty());
        assert!(snap.get("anything").is_none());
    }

    #[test]
    fn operation_accessors() {
        let op = Operation::new(
            OperationId(7),
            OperationType::RequestAllocate,
            EntityRef::request("R1"),
            Snapshot::empty(),
            Snapshot::from(json!({"state": "allocated"})),
            vec![EntityRef::zone("Z1"), EntityRef::slot("A1-S001")],
        );
        assert_eq!(op.entity_id(), "R1");
        assert_eq!(op.related_id(EntityKind::Slot), Some("A1-S001"));
        assert_eq!(op.related_id(EntityKind::Area), None);
        assert!(!op.is_rolled_back());
        assert_eq!(op.to_string(), "OP-000007 request_allocate request:R1");
    }

    #[test]
    fn operation_type_names_match_serde() {
        for ty in OperationType::ALL {
            let encoded = serde_json::to_value(ty).unwrap();
            assert_eq!(encoded, json!(ty.as_str()));
        }
    }
}
