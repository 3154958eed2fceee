//! The allocation engine: placement, lifecycle driving, bookkeeping.
//!
//! Every mutating call follows the same order: check the request
//! transition, mutate the slot, apply the transition, update counters,
//! move the request between collections. The transition is checked before
//! the slot is touched, so a call either applies both or neither.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use slot_topology::Topology;
use slot_types::{
    AllocationError, AllocationResult, Request, RequestId, RequestState, RequesterRef, SlotPath,
};
use tracing::{debug, info, warn};

use crate::{AllocationOutcome, PriorityRequestQueue, ReleaseReceipt};

const REJECT_REASON: &str = "no slot available";

/// Owns pending, active and completed requests
#[derive(Clone, Debug, Default)]
pub struct AllocationEngine {
    pending: PriorityRequestQueue,
    /// Requests currently ALLOCATED or OCCUPIED
    active: HashMap<RequestId, Request>,
    /// Terminal requests in completion order
    completed: Vec<Request>,
    /// Every id ever accepted by `submit` or `allocate`
    seen: HashSet<RequestId>,
    total_allocations: u64,
    successful_allocations: u64,
    failed_allocations: u64,
    cross_zone_allocations: u64,
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Submission & placement ───────────────────────────────────────

    /// Queue a request for later placement.
    pub fn submit(&mut self, request: Request) -> AllocationResult<()> {
        request.check_transition(RequestState::Allocated)?;
        if self.seen.contains(request.id()) {
            return Err(AllocationError::DuplicateRequest(request.id().clone()));
        }
        debug!(
            request_id = %request.id(),
            priority = %request.priority(),
            queue_len = self.pending.len() + 1,
            "Request queued"
        );
        let id = request.id().clone();
        self.pending.enqueue(request)?;
        self.seen.insert(id);
        Ok(())
    }

    /// Place a request now.
    ///
    /// Search order:
    /// 1. first free slot in the preferred zone
    /// 2. if fallback is allowed, each adjacent zone in adjacency order
    /// 3. if fallback is allowed (or no preference was given), every zone
    ///
    /// When nothing is free the request is REJECTED and archived and the
    /// returned outcome has `success == false`. `Err` is only returned for
    /// caller mistakes: a request that is not REQUESTED, or an id the
    /// engine has already seen (pending, active or archived).
    pub fn allocate<T: Topology + ?Sized>(
        &mut self,
        request: Request,
        topology: &mut T,
    ) -> AllocationResult<AllocationOutcome> {
        request.check_transition(RequestState::Allocated)?;
        if !self.seen.insert(request.id().clone()) {
            return Err(AllocationError::DuplicateRequest(request.id().clone()));
        }
        self.place(request, topology)
    }

    fn place<T: Topology + ?Sized>(
        &mut self,
        mut request: Request,
        topology: &mut T,
    ) -> AllocationResult<AllocationOutcome> {
        self.total_allocations += 1;
        let (path, cross_zone) = match find_placement(&request, topology) {
            Ok(found) => found,
            Err(message) => return self.reject(request, message),
        };

        let slot = match topology.resolve_mut(&path) {
            Ok(slot) => slot,
            Err(e) => return self.reject(request, format!("{REJECT_REASON}: {e}")),
        };
        if !slot.reserve(request.id().clone()) {
            return self.reject(
                request,
                format!("{REJECT_REASON}: slot {} refused reservation", path.slot_id),
            );
        }
        if let Err(e) = request.allocate(path.clone()) {
            slot.cancel_reservation();
            return Err(e);
        }

        self.successful_allocations += 1;
        if cross_zone {
            self.cross_zone_allocations += 1;
        }
        info!(
            request_id = %request.id(),
            slot = %path,
            cross_zone,
            "Request allocated"
        );

        let outcome = AllocationOutcome::placed(request.clone(), path, cross_zone);
        self.active.insert(request.id().clone(), request);
        Ok(outcome)
    }

    /// Place the highest-ranked pending request, if any.
    pub fn process_next<T: Topology + ?Sized>(
        &mut self,
        topology: &mut T,
    ) -> Option<AllocationOutcome> {
        loop {
            let request = self.pending.dequeue()?;
            let id = request.id().clone();
            match self.place(request, topology) {
                Ok(outcome) => return Some(outcome),
                Err(e) => warn!(request_id = %id, error = %e, "Dropped unplaceable queued request"),
            }
        }
    }

    /// Place every pending request in queue order. Rejections are final.
    pub fn drain_pending<T: Topology + ?Sized>(
        &mut self,
        topology: &mut T,
    ) -> Vec<AllocationOutcome> {
        let mut results = Vec::with_capacity(self.pending.len());
        while let Some(outcome) = self.process_next(topology) {
            results.push(outcome);
        }
        results
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// ALLOCATED → OCCUPIED, marking the reserved slot occupied.
    pub fn occupy<T: Topology + ?Sized>(
        &mut self,
        id: &RequestId,
        occupant: RequesterRef,
        topology: &mut T,
    ) -> AllocationResult<()> {
        let path = self.active_path(id, RequestState::Occupied)?;
        let slot = topology.resolve_mut(&path)?;
        if !slot.occupy(occupant, Some(id.clone())) {
            return Err(AllocationError::SlotUnavailable(path.slot_id));
        }

        self.active_mut(id)?.occupy()?;
        info!(request_id = %id, slot = %path, "Slot occupied");
        Ok(())
    }

    /// OCCUPIED → RELEASED, freeing the slot and archiving the request.
    pub fn release<T: Topology + ?Sized>(
        &mut self,
        id: &RequestId,
        topology: &mut T,
    ) -> AllocationResult<ReleaseReceipt> {
        let path = self.active_path(id, RequestState::Released)?;
        let slot = topology.resolve_mut(&path)?;
        if !slot.is_occupied() || slot.request_id.as_ref() != Some(id) {
            return Err(AllocationError::SlotUnavailable(path.slot_id));
        }
        let slot_release = slot.release();

        self.active_mut(id)?.release()?;
        let request = self.archive_active(id)?;
        info!(
            request_id = %id,
            slot = %path,
            duration_secs = slot_release.duration.map(|d| d.num_seconds()),
            "Slot released"
        );
        Ok(ReleaseReceipt {
            request,
            slot: slot_release,
        })
    }

    /// Cancel a pending or allocated request.
    ///
    /// A reservation held by the request is handed back to the topology.
    /// OCCUPIED requests cannot be cancelled; release them instead.
    pub fn cancel<T: Topology + ?Sized>(
        &mut self,
        id: &RequestId,
        topology: &mut T,
        reason: impl Into<String>,
    ) -> AllocationResult<()> {
        self.close(id, topology, RequestState::Cancelled, reason.into())
    }

    /// Expire a pending or allocated request. Expiry policy belongs to the
    /// caller; the engine never expires requests on its own.
    pub fn expire<T: Topology + ?Sized>(
        &mut self,
        id: &RequestId,
        topology: &mut T,
    ) -> AllocationResult<()> {
        self.close(id, topology, RequestState::Expired, String::new())
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Find a request wherever it lives: pending, active, then archive.
    pub fn lookup(&self, id: &RequestId) -> Option<&Request> {
        self.pending
            .get(id)
            .or_else(|| self.active.get(id))
            .or_else(|| self.completed.iter().find(|r| r.id() == id))
    }

    pub fn is_pending(&self, id: &RequestId) -> bool {
        self.pending.contains(id)
    }

    pub fn is_active(&self, id: &RequestId) -> bool {
        self.active.contains_key(id)
    }

    pub fn pending(&self) -> &PriorityRequestQueue {
        &self.pending
    }

    /// Pending requests, front of the queue first
    pub fn pending_requests(&self) -> Vec<&Request> {
        self.pending.iter().collect()
    }

    /// Active requests, oldest allocation first
    pub fn active_requests(&self) -> Vec<&Request> {
        let mut active: Vec<&Request> = self.active.values().collect();
        active.sort_by_key(|r| (r.allocated_at(), r.created_at()));
        active
    }

    pub fn completed_requests(&self) -> &[Request] {
        &self.completed
    }

    pub fn stats(&self) -> AllocationStats {
        AllocationStats {
            total_allocations: self.total_allocations,
            successful_allocations: self.successful_allocations,
            failed_allocations: self.failed_allocations,
            cross_zone_allocations: self.cross_zone_allocations,
            pending_count: self.pending.len(),
            active_count: self.active.len(),
            completed_count: self.completed.len(),
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn reject(
        &mut self,
        mut request: Request,
        message: String,
    ) -> AllocationResult<AllocationOutcome> {
        request.reject(REJECT_REASON)?;
        self.failed_allocations += 1;
        warn!(request_id = %request.id(), %message, "Request rejected");
        let outcome = AllocationOutcome::rejected(request.clone(), message);
        self.completed.push(request);
        Ok(outcome)
    }

    /// Placement of an active request, after checking it may move to `next`
    fn active_path(&self, id: &RequestId, next: RequestState) -> AllocationResult<SlotPath> {
        let request = self
            .active
            .get(id)
            .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))?;
        request.check_transition(next)?;
        request
            .placement()
            .cloned()
            .ok_or_else(|| AllocationError::NotPlaced(id.clone()))
    }

    fn active_mut(&mut self, id: &RequestId) -> AllocationResult<&mut Request> {
        self.active
            .get_mut(id)
            .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))
    }

    fn archive_active(&mut self, id: &RequestId) -> AllocationResult<Request> {
        let request = self
            .active
            .remove(id)
            .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))?;
        self.completed.push(request.clone());
        Ok(request)
    }

    /// Move a pending or allocated request to CANCELLED or EXPIRED.
    fn close<T: Topology + ?Sized>(
        &mut self,
        id: &RequestId,
        topology: &mut T,
        target: RequestState,
        reason: String,
    ) -> AllocationResult<()> {
        if let Some(request) = self.pending.get(id) {
            request.check_transition(target)?;
            let mut request = self
                .pending
                .remove(id)
                .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))?;
            apply_close(&mut request, target, reason)?;
            info!(request_id = %id, state = %target, "Pending request closed");
            self.completed.push(request);
            return Ok(());
        }

        let request = self
            .active
            .get(id)
            .ok_or_else(|| AllocationError::RequestNotFound(id.clone()))?;
        request.check_transition(target)?;
        if let Some(path) = request.placement() {
            match topology.resolve_mut(path) {
                Ok(slot) if slot.is_reserved() && slot.request_id.as_ref() == Some(id) => {
                    slot.cancel_reservation();
                }
                Ok(_) => {}
                Err(e) => warn!(request_id = %id, error = %e, "Reservation no longer resolves"),
            }
        }

        apply_close(self.active_mut(id)?, target, reason)?;
        self.archive_active(id)?;
        info!(request_id = %id, state = %target, "Active request closed");
        Ok(())
    }
}

fn apply_close(
    request: &mut Request,
    target: RequestState,
    reason: String,
) -> AllocationResult<()> {
    match target {
        RequestState::Expired => request.expire(),
        _ => request.cancel(reason),
    }
}

/// First-fit search. Returns the path and whether it leaves the preferred
/// zone, or the failure message.
fn find_placement<T: Topology + ?Sized>(
    request: &Request,
    topology: &T,
) -> Result<(SlotPath, bool), String> {
    let slot_type = request.slot_type();
    let preferred = request.preferred_zone();

    if let Some(zone) = preferred {
        if topology.has_zone(zone) {
            if let Some(path) = topology.find_first_available(zone, slot_type) {
                return Ok((path, false));
            }
            if !request.allows_fallback() {
                return Err(format!(
                    "{REJECT_REASON} in zone {zone} and cross-zone fallback is disabled"
                ));
            }
            for adjacent in topology.adjacent_zones(zone) {
                if let Some(path) = topology.find_first_available(&adjacent, slot_type) {
                    return Ok((path, true));
                }
            }
        } else if !request.allows_fallback() {
            return Err(format!(
                "{REJECT_REASON}: zone {zone} does not exist and cross-zone fallback is disabled"
            ));
        }
    }

    for zone in topology.zone_ids() {
        if let Some(path) = topology.find_first_available(&zone, slot_type) {
            let cross_zone = preferred.is_some_and(|p| p != &zone);
            return Ok((path, cross_zone));
        }
    }
    Err(format!("{REJECT_REASON} in any zone"))
}

/// Counters and collection sizes
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationStats {
    /// Placement attempts
    pub total_allocations: u64,
    pub successful_allocations: u64,
    pub failed_allocations: u64,
    pub cross_zone_allocations: u64,
    pub pending_count: usize,
    pub active_count: usize,
    pub completed_count: usize,
}

impl AllocationStats {
    /// Successful share of attempts, in percent
    pub fn success_rate(&self) -> f64 {
        if self.total_allocations == 0 {
            return 0.0;
        }
        self.successful_allocations as f64 / self.total_allocations as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_topology::InMemoryTopology;
    use slot_types::{AreaId, RequestPriority, SlotId, SlotType, ZoneId};

    fn zone(id: &str) -> ZoneId {
        ZoneId::new(id)
    }

    /// Z1 (1 slot) ─ Z2 (1 slot), Z3 (2 slots) unlinked
    fn topology() -> InMemoryTopology {
        let mut t = InMemoryTopology::new();
        for (z, a, n) in [("Z1", "A1", 1), ("Z2", "B1", 1), ("Z3", "C1", 2)] {
            t.create_zone(zone(z), z).unwrap();
            t.create_area(&zone(z), AreaId::new(a), "L1", 1, n, SlotType::Regular)
                .unwrap();
        }
        t.link_zones(&zone("Z1"), &zone("Z2")).unwrap();
        t
    }

    fn fill(engine: &mut AllocationEngine, t: &mut InMemoryTopology, z: &str) {
        let out = engine
            .allocate(
                Request::new("filler").with_preferred_zone(zone(z)).with_fallback(false),
                t,
            )
            .unwrap();
        assert!(out.success);
    }

    #[test]
    fn preferred_zone_first() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(Request::new("V-1").with_preferred_zone(zone("Z3")), &mut t)
            .unwrap();
        assert!(out.success);
        assert!(!out.cross_zone);
        assert_eq!(out.placement.unwrap().slot_id, SlotId::new("C1-S001"));
        assert_eq!(out.request.state(), RequestState::Allocated);
        assert_eq!(e.stats().cross_zone_allocations, 0);
    }

    #[test]
    fn fallback_disabled_stays_in_preferred_zone() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(
                Request::new("V-1").with_preferred_zone(zone("Z2")).with_fallback(false),
                &mut t,
            )
            .unwrap();
        assert_eq!(out.zone_id(), Some(&zone("Z2")));

        let out = e
            .allocate(
                Request::new("V-2").with_preferred_zone(zone("Z2")).with_fallback(false),
                &mut t,
            )
            .unwrap();
        assert!(!out.success);
        assert!(out.message.contains("no slot available"));
        assert_eq!(out.request.state(), RequestState::Rejected);
        assert!(out.placement.is_none());
        // other zones still have room
        assert!(t.totals().available > 0);
    }

    #[test]
    fn fallback_to_adjacent_zone() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        fill(&mut e, &mut t, "Z1");

        let out = e
            .allocate(Request::new("V-2").with_preferred_zone(zone("Z1")), &mut t)
            .unwrap();
        assert!(out.success);
        assert!(out.cross_zone);
        assert_eq!(out.zone_id(), Some(&zone("Z2")));
        assert_eq!(e.stats().cross_zone_allocations, 1);
    }

    #[test]
    fn fallback_to_any_zone_when_neighbours_full() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        fill(&mut e, &mut t, "Z1");
        fill(&mut e, &mut t, "Z2");

        let out = e
            .allocate(Request::new("V-3").with_preferred_zone(zone("Z1")), &mut t)
            .unwrap();
        assert_eq!(out.zone_id(), Some(&zone("Z3")));
        assert!(out.cross_zone);
        assert_eq!(e.stats().cross_zone_allocations, 1);
    }

    #[test]
    fn no_preference_scans_in_topology_order_without_cross_zone() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        assert_eq!(out.zone_id(), Some(&zone("Z1")));
        assert!(!out.cross_zone);
    }

    #[test]
    fn unknown_preferred_zone_falls_back_to_scan() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(Request::new("V-1").with_preferred_zone(zone("Z9")), &mut t)
            .unwrap();
        assert_eq!(out.zone_id(), Some(&zone("Z1")));
        assert!(out.cross_zone);

        let out = e
            .allocate(
                Request::new("V-2").with_preferred_zone(zone("Z9")).with_fallback(false),
                &mut t,
            )
            .unwrap();
        assert!(!out.success);
    }

    #[test]
    fn slot_type_filter_applies_to_every_step() {
        let mut t = topology();
        t.create_area(&zone("Z3"), AreaId::new("C2"), "EV", 1, 1, SlotType::Electric)
            .unwrap();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(
                Request::new("EV-1")
                    .with_preferred_zone(zone("Z1"))
                    .with_slot_type(SlotType::Electric),
                &mut t,
            )
            .unwrap();
        assert_eq!(out.placement.unwrap().area_id, AreaId::new("C2"));
    }

    #[test]
    fn exhaustion_rejects_and_archives() {
        let mut t = InMemoryTopology::new();
        t.create_zone(zone("Z1"), "Empty").unwrap();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        assert!(!out.success);
        assert_eq!(out.message, "no slot available in any zone");

        let stats = e.stats();
        assert_eq!(stats.total_allocations, 1);
        assert_eq!(stats.failed_allocations, 1);
        assert_eq!(stats.completed_count, 1);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(
            e.lookup(&out.request_id).unwrap().state(),
            RequestState::Rejected
        );
    }

    #[test]
    fn allocate_refuses_non_requested_and_duplicates() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();

        let twin = Request::new("V-1").with_id(out.request_id.clone());
        assert!(matches!(
            e.allocate(twin, &mut t),
            Err(AllocationError::DuplicateRequest(_))
        ));

        let mut done = Request::new("V-2");
        done.cancel("gone").unwrap();
        assert!(matches!(
            e.allocate(done, &mut t),
            Err(AllocationError::InvalidTransition { .. })
        ));
        assert_eq!(e.stats().total_allocations, 1);
    }

    #[test]
    fn archived_id_cannot_be_reused() {
        let mut t = InMemoryTopology::new();
        t.create_zone(zone("Z1"), "Z1").unwrap();
        let mut e = AllocationEngine::new();
        let first = Request::new("V-1").with_id(RequestId::new("DUP"));
        assert!(!e.allocate(first, &mut t).unwrap().success);

        t.create_area(&zone("Z1"), AreaId::new("A1"), "L1", 1, 1, SlotType::Regular)
            .unwrap();
        let again = Request::new("V-2").with_id(RequestId::new("DUP"));
        assert!(matches!(
            e.allocate(again.clone(), &mut t),
            Err(AllocationError::DuplicateRequest(_))
        ));
        assert!(matches!(
            e.submit(again),
            Err(AllocationError::DuplicateRequest(_))
        ));

        let stored = e.lookup(&RequestId::new("DUP")).unwrap();
        assert_eq!(stored.state(), RequestState::Rejected);
        assert_eq!(stored.requester().as_str(), "V-1");
        assert!(e.pending().is_empty());
        assert_eq!(e.stats().total_allocations, 1);
    }

    #[test]
    fn drain_in_priority_order() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let low = Request::new("low").with_priority(RequestPriority::Low);
        let vip = Request::new("vip").with_priority(RequestPriority::Vip);
        let low_id = low.id().clone();
        let vip_id = vip.id().clone();
        e.submit(low).unwrap();
        e.submit(vip).unwrap();

        let results = e.drain_pending(&mut t);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].request_id, vip_id);
        assert_eq!(results[1].request_id, low_id);
        assert_eq!(results[0].zone_id(), Some(&zone("Z1")));
        assert!(e.pending().is_empty());
        assert_eq!(e.stats().active_count, 2);
    }

    #[test]
    fn drain_does_not_retry_rejections() {
        let mut t = InMemoryTopology::new();
        t.create_zone(zone("Z1"), "Z1").unwrap();
        t.create_area(&zone("Z1"), AreaId::new("A1"), "L1", 1, 1, SlotType::Regular)
            .unwrap();
        let mut e = AllocationEngine::new();
        e.submit(Request::new("a")).unwrap();
        e.submit(Request::new("b")).unwrap();

        let results = e.drain_pending(&mut t);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(e.drain_pending(&mut t).is_empty());
    }

    #[test]
    fn occupy_release_round_trip() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(Request::new("V-1").with_preferred_zone(zone("Z1")), &mut t)
            .unwrap();
        let id = out.request_id.clone();
        let path = out.placement.clone().unwrap();

        e.occupy(&id, RequesterRef::new("V-1"), &mut t).unwrap();
        assert!(t.slot(&path).unwrap().is_occupied());

        let receipt = e.release(&id, &mut t).unwrap();
        assert_eq!(receipt.request.state(), RequestState::Released);
        assert_eq!(receipt.request.placement(), Some(&path));
        assert!(receipt.duration().unwrap() >= chrono::Duration::zero());
        assert!(receipt.request.occupancy_duration().unwrap() >= chrono::Duration::zero());
        assert!(t.slot(&path).unwrap().is_available());
        assert!(!e.is_active(&id));
        assert_eq!(e.completed_requests().len(), 1);
    }

    #[test]
    fn release_requires_occupancy() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        let err = e.release(&out.request_id, &mut t).unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition { .. }));
        assert!(t.slot(out.placement.as_ref().unwrap()).unwrap().is_reserved());
    }

    #[test]
    fn occupy_fails_when_path_no_longer_resolves() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e
            .allocate(Request::new("V-1").with_preferred_zone(zone("Z3")), &mut t)
            .unwrap();
        // cancel the reservation behind the engine's back, then drop the area
        let path = out.placement.clone().unwrap();
        t.resolve_mut(&path).unwrap().cancel_reservation();
        t.remove_area(&zone("Z3"), &AreaId::new("C1")).unwrap();

        let err = e
            .occupy(&out.request_id, RequesterRef::new("V-1"), &mut t)
            .unwrap_err();
        assert_eq!(err, AllocationError::AreaNotFound(AreaId::new("C1")));
        assert_eq!(
            e.lookup(&out.request_id).unwrap().state(),
            RequestState::Allocated
        );
    }

    #[test]
    fn occupy_unknown_request() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let err = e
            .occupy(&RequestId::new("nope"), RequesterRef::new("x"), &mut t)
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn cancel_pending_request() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let r = Request::new("V-1");
        let id = r.id().clone();
        e.submit(r).unwrap();

        e.cancel(&id, &mut t, "User cancelled").unwrap();
        assert!(!e.is_pending(&id));
        let archived = e.lookup(&id).unwrap();
        assert_eq!(archived.state(), RequestState::Cancelled);
        assert_eq!(archived.history()[0].reason, "User cancelled");
    }

    #[test]
    fn cancel_allocated_request_frees_reservation() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        let path = out.placement.clone().unwrap();

        e.cancel(&out.request_id, &mut t, "Changed plans").unwrap();
        assert!(t.slot(&path).unwrap().is_available());
        assert_eq!(
            e.lookup(&out.request_id).unwrap().state(),
            RequestState::Cancelled
        );
        // placement is kept for history
        assert_eq!(e.lookup(&out.request_id).unwrap().placement(), Some(&path));
    }

    #[test]
    fn cancel_occupied_request_fails_without_side_effects() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        let id = out.request_id.clone();
        e.occupy(&id, RequesterRef::new("V-1"), &mut t).unwrap();

        let err = e.cancel(&id, &mut t, "nope").unwrap_err();
        assert!(matches!(err, AllocationError::InvalidTransition { .. }));
        assert!(e.is_active(&id));
        assert!(t.slot(out.placement.as_ref().unwrap()).unwrap().is_occupied());
    }

    #[test]
    fn cancel_unknown_request() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let err = e
            .cancel(&RequestId::new("ghost"), &mut t, "x")
            .unwrap_err();
        assert_eq!(err, AllocationError::RequestNotFound(RequestId::new("ghost")));
    }

    #[test]
    fn expire_allocated_request() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let out = e.allocate(Request::new("V-1"), &mut t).unwrap();
        e.expire(&out.request_id, &mut t).unwrap();
        assert_eq!(
            e.lookup(&out.request_id).unwrap().state(),
            RequestState::Expired
        );
        assert!(t.slot(out.placement.as_ref().unwrap()).unwrap().is_available());
    }

    #[test]
    fn lookup_checks_every_collection() {
        let mut t = topology();
        let mut e = AllocationEngine::new();
        let queued = Request::new("q");
        let queued_id = queued.id().clone();
        e.submit(queued).unwrap();
        let out = e.allocate(Request::new("a"), &mut t).unwrap();

        assert_eq!(e.lookup(&queued_id).unwrap().state(), RequestState::Requested);
        assert_eq!(
            e.lookup(&out.request_id).unwrap().state(),
            RequestState::Allocated
        );
        assert!(e.lookup(&RequestId::new("missing")).is_none());
    }

    #[test]
    fn single_slot_scenario() {
        let mut t = InMemoryTopology::new();
        t.create_zone(zone("Z1"), "Z1").unwrap();
        t.create_area(&zone("Z1"), AreaId::new("A1"), "L1", 1, 1, SlotType::Regular)
            .unwrap();
        let mut e = AllocationEngine::new();

        let r1 = e
            .allocate(
                Request::new("R1")
                    .with_priority(RequestPriority::Normal)
                    .with_preferred_zone(zone("Z1")),
                &mut t,
            )
            .unwrap();
        assert!(r1.success);
        assert_eq!(r1.placement.unwrap().slot_id, SlotId::new("A1-S001"));

        let r2 = e
            .allocate(
                Request::new("R2")
                    .with_priority(RequestPriority::Vip)
                    .with_preferred_zone(zone("Z1"))
                    .with_fallback(false),
                &mut t,
            )
            .unwrap();
        assert!(!r2.success);
        assert_eq!(r2.request.state(), RequestState::Rejected);
        assert!(r2.message.contains("no slot available"));
        assert!(r2.placement.is_none());
    }
}
