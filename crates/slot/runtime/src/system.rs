//! The allocation system facade.
//!
//! Every state-mutating call goes through here so it can be recorded in the
//! rollback log with before/after snapshots. Callers sharing one system
//! across threads wrap the whole `AllocationSystem` in a mutex; all
//! mutating methods take `&mut self`.

use chrono::{DateTime, Utc};
use slot_engine::{AllocationEngine, AllocationOutcome, ReleaseReceipt};
use slot_rollback::{
    EntityRef, Operation, OperationType, RollbackManager, RollbackReport, Snapshot,
};
use slot_topology::{InMemoryTopology, SlotRelease, Topology, Zone};
use slot_types::{
    AllocationError, AreaId, Request, RequestId, RequesterRef, SlotId, SlotPath, SlotType, ZoneId,
};
use tracing::info;

use crate::error::SystemResult;
use crate::stats::{SystemStats, ZoneStats};
use crate::{handlers, SystemConfig, SystemState};

/// Topology, engine and rollback log behind one API.
#[derive(Debug)]
pub struct AllocationSystem {
    config: SystemConfig,
    state: SystemState,
    rollback: RollbackManager<SystemState>,
    created_at: DateTime<Utc>,
}

impl AllocationSystem {
    pub fn new(config: SystemConfig) -> SystemResult<Self> {
        config.validate()?;
        let rollback = handlers::rollback_manager(config.history_capacity);
        info!(
            name = %config.name,
            history_capacity = config.history_capacity,
            "Allocation system created"
        );
        Ok(Self {
            config,
            state: SystemState::new(),
            rollback,
            created_at: Utc::now(),
        })
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    /// Install the global subscriber using `config.log_filter` unless
    /// `RUST_LOG` overrides it. Returns `false` if one was already set.
    pub fn init_tracing(&self) -> bool {
        crate::telemetry::init_tracing(&self.config.log_filter)
    }

    pub fn topology(&self) -> &InMemoryTopology {
        &self.state.topology
    }

    pub fn engine(&self) -> &AllocationEngine {
        &self.state.engine
    }

    pub fn rollback_manager(&self) -> &RollbackManager<SystemState> {
        &self.rollback
    }

    // ── Topology ─────────────────────────────────────────────────────

    pub fn create_zone(
        &mut self,
        zone_id: ZoneId,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> SystemResult<()> {
        let zone = Zone::new(zone_id.clone(), name).with_description(description);
        let after = Snapshot::capture(&zone)?;
        self.state.topology.add_zone(zone)?;
        self.rollback.record(
            OperationType::ZoneCreate,
            EntityRef::zone(zone_id.as_str()),
            Snapshot::empty(),
            after,
            Vec::new(),
        );
        info!(zone = %zone_id, "Zone created");
        Ok(())
    }

    /// Create an area of `slot_count` slots of one type.
    pub fn create_area(
        &mut self,
        zone_id: &ZoneId,
        area_id: AreaId,
        name: impl Into<String>,
        floor: i32,
        slot_count: usize,
        slot_type: SlotType,
    ) -> SystemResult<Vec<SlotId>> {
        let slots = self.state.topology.create_area(
            zone_id,
            area_id.clone(),
            name,
            floor,
            slot_count,
            slot_type,
        )?;
        let after = match self.state.topology.area(zone_id, &area_id) {
            Some(area) => Snapshot::capture(area)?,
            None => Snapshot::empty(),
        };
        self.rollback.record(
            OperationType::AreaCreate,
            EntityRef::area(area_id.as_str()),
            Snapshot::empty(),
            after,
            vec![EntityRef::zone(zone_id.as_str())],
        );
        info!(zone = %zone_id, area = %area_id, slots = slots.len(), "Area created");
        Ok(slots)
    }

    /// Make two zones adjacent in both directions. Not recorded.
    pub fn link_zones(&mut self, a: &ZoneId, b: &ZoneId) -> SystemResult<()> {
        self.state.topology.link_zones(a, b)?;
        Ok(())
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Record the request and, with `auto_allocate`, place it immediately;
    /// otherwise queue it.
    pub fn submit_request(&mut self, request: Request) -> SystemResult<AllocationOutcome> {
        let id = request.id().clone();
        let before = Snapshot::capture(&request)?;

        if self.config.auto_allocate {
            let outcome = self
                .state
                .engine
                .allocate(request, &mut self.state.topology)?;
            self.record_request(
                OperationType::RequestCreate,
                &id,
                Snapshot::empty(),
                before.clone(),
                Vec::new(),
            );
            if outcome.success {
                self.record_allocation(before, &outcome)?;
            }
            Ok(outcome)
        } else {
            self.state.engine.submit(request.clone())?;
            self.record_request(
                OperationType::RequestCreate,
                &id,
                Snapshot::empty(),
                before,
                Vec::new(),
            );
            Ok(AllocationOutcome::queued(request))
        }
    }

    /// Place every queued request in priority order.
    pub fn process_pending(&mut self) -> SystemResult<Vec<AllocationOutcome>> {
        let mut results = Vec::new();
        loop {
            let before = match self.state.engine.pending().peek() {
                Some(request) => Snapshot::capture(request)?,
                None => break,
            };
            let Some(outcome) = self.state.engine.process_next(&mut self.state.topology) else {
                break;
            };
            if outcome.success {
                self.record_allocation(before, &outcome)?;
            }
            results.push(outcome);
        }
        Ok(results)
    }

    /// The requester enters the reserved slot.
    pub fn occupy(&mut self, id: &RequestId) -> SystemResult<()> {
        let (before, occupant) = {
            let request = self.request(id)?;
            (Snapshot::capture(request)?, request.requester().clone())
        };
        self.state
            .engine
            .occupy(id, occupant, &mut self.state.topology)?;
        let after = Snapshot::capture(self.request(id)?)?;
        self.record_request(OperationType::RequestOccupy, id, before, after, Vec::new());
        Ok(())
    }

    /// The requester leaves; the slot is freed and the request archived.
    pub fn release(&mut self, id: &RequestId) -> SystemResult<ReleaseReceipt> {
        let before = Snapshot::capture(self.request(id)?)?;
        let receipt = self.state.engine.release(id, &mut self.state.topology)?;
        self.state.requests_served += 1;
        let after = Snapshot::capture(&receipt.request)?;
        self.record_request(OperationType::RequestRelease, id, before, after, Vec::new());
        Ok(receipt)
    }

    pub fn cancel(&mut self, id: &RequestId, reason: impl Into<String>) -> SystemResult<()> {
        let before = Snapshot::capture(self.request(id)?)?;
        self.state
            .engine
            .cancel(id, &mut self.state.topology, reason)?;
        let after = Snapshot::capture(self.request(id)?)?;
        self.record_request(OperationType::RequestCancel, id, before, after, Vec::new());
        Ok(())
    }

    pub fn expire(&mut self, id: &RequestId) -> SystemResult<()> {
        let before = Snapshot::capture(self.request(id)?)?;
        self.state.engine.expire(id, &mut self.state.topology)?;
        let after = Snapshot::capture(self.request(id)?)?;
        self.record_request(OperationType::RequestExpire, id, before, after, Vec::new());
        Ok(())
    }

    pub fn lookup(&self, id: &RequestId) -> Option<&Request> {
        self.state.engine.lookup(id)
    }

    pub fn pending_requests(&self) -> Vec<&Request> {
        self.state.engine.pending_requests()
    }

    pub fn active_requests(&self) -> Vec<&Request> {
        self.state.engine.active_requests()
    }

    // ── Direct slot operations ───────────────────────────────────────

    /// Hold a slot for an externally managed booking.
    pub fn reserve_slot(&mut self, path: &SlotPath, holder: RequestId) -> SystemResult<()> {
        let slot = self.state.topology.resolve_mut(path)?;
        let before = Snapshot::capture(&*slot)?;
        if !slot.reserve(holder) {
            return Err(AllocationError::SlotUnavailable(path.slot_id.clone()).into());
        }
        let after = Snapshot::capture(&*slot)?;
        self.record_slot(OperationType::SlotReserve, path, before, after);
        Ok(())
    }

    /// Seat an occupant without a request.
    pub fn occupy_walk_in(
        &mut self,
        path: &SlotPath,
        occupant: RequesterRef,
    ) -> SystemResult<()> {
        let slot = self.state.topology.resolve_mut(path)?;
        let before = Snapshot::capture(&*slot)?;
        if !slot.is_available() || !slot.occupy(occupant, None) {
            return Err(AllocationError::SlotUnavailable(path.slot_id.clone()).into());
        }
        let after = Snapshot::capture(&*slot)?;
        self.record_slot(OperationType::SlotOccupy, path, before, after);
        Ok(())
    }

    /// Free a slot held by a walk-in occupant.
    pub fn release_walk_in(&mut self, path: &SlotPath) -> SystemResult<SlotRelease> {
        let slot = self.state.topology.resolve_mut(path)?;
        if !slot.is_occupied() || slot.request_id.is_some() {
            return Err(AllocationError::SlotUnavailable(path.slot_id.clone()).into());
        }
        let before = Snapshot::capture(&*slot)?;
        let released = slot.release();
        let after = Snapshot::capture(&*slot)?;
        self.record_slot(OperationType::SlotRelease, path, before, after);
        Ok(released)
    }

    // ── Rollback ─────────────────────────────────────────────────────

    pub fn rollback_last(&mut self) -> SystemResult<RollbackReport> {
        Ok(self.rollback.rollback_last(&mut self.state)?)
    }

    pub fn rollback_k(&mut self, k: usize) -> SystemResult<RollbackReport> {
        Ok(self.rollback.rollback_k(k, &mut self.state)?)
    }

    pub fn can_rollback(&self) -> bool {
        self.rollback.can_rollback()
    }

    /// Up to `limit` most recent operations, newest first
    pub fn history(&self, limit: usize) -> Vec<&Operation> {
        self.rollback.last_k_operations(limit)
    }

    // ── Statistics ───────────────────────────────────────────────────

    pub fn stats(&self) -> SystemStats {
        let totals = self.state.topology.totals();
        SystemStats {
            name: self.config.name.clone(),
            created_at: self.created_at,
            utilization: totals.utilization(),
            topology: totals,
            requests_served: self.state.requests_served,
            allocation: self.state.engine.stats(),
            rollback: self.rollback.stats(),
        }
    }

    pub fn zone_stats(&self) -> Vec<ZoneStats> {
        self.state.topology.zones().iter().map(ZoneStats::from).collect()
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn request(&self, id: &RequestId) -> SystemResult<&Request> {
        Ok(self
            .state
            .engine
            .lookup(id)
            .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))?)
    }

    fn record_request(
        &mut self,
        op_type: OperationType,
        id: &RequestId,
        before: Snapshot,
        after: Snapshot,
        related: Vec<EntityRef>,
    ) {
        self.rollback.record(
            op_type,
            EntityRef::request(id.as_str()),
            before,
            after,
            related,
        );
    }

    fn record_allocation(
        &mut self,
        before: Snapshot,
        outcome: &AllocationOutcome,
    ) -> SystemResult<()> {
        let related = outcome
            .placement
            .as_ref()
            .map(|p| {
                vec![
                    EntityRef::zone(p.zone_id.as_str()),
                    EntityRef::area(p.area_id.as_str()),
                    EntityRef::slot(p.slot_id.as_str()),
                ]
            })
            .unwrap_or_default();
        let after = Snapshot::capture(&outcome.request)?;
        self.record_request(
            OperationType::RequestAllocate,
            &outcome.request_id,
            before,
            after,
            related,
        );
        Ok(())
    }

    fn record_slot(
        &mut self,
        op_type: OperationType,
        path: &SlotPath,
        before: Snapshot,
        after: Snapshot,
    ) {
        self.rollback.record(
            op_type,
            EntityRef::slot(path.slot_id.as_str()),
            before,
            after,
            vec![
                EntityRef::zone(path.zone_id.as_str()),
                EntityRef::area(path.area_id.as_str()),
            ],
        );
    }
}

impl Default for AllocationSystem {
    fn default() -> Self {
        Self {
            config: SystemConfig::default(),
            state: SystemState::new(),
            rollback: handlers::rollback_manager(SystemConfig::default().history_capacity),
            created_at: Utc::now(),
        }
    }
}
