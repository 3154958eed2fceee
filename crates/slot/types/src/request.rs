//! Allocation requests and their lifecycle.
//!
//! A [`Request`] is created in [`RequestState::Requested`]. The only way to
//! change its state is through the transition methods (`allocate`, `occupy`,
//! `release`, `cancel`, `reject`, `expire`), each of which consults the
//! transition table first and appends a [`StateTransition`] on success.

use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    AllocationError, AllocationResult, RequestId, RequestPriority, RequestState, RequesterRef,
    SlotPath, SlotType, StateTransition, ZoneId,
};

/// A stateful demand for exactly one slot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Request {
    id: RequestId,
    requester: RequesterRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    preferred_zone: Option<ZoneId>,
    priority: RequestPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    requested_duration: Option<Duration>,
    /// Whether placement may leave the preferred zone
    cross_zone_fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    slot_type: Option<SlotType>,

    state: RequestState,
    /// Set on allocation and kept for history after release
    #[serde(skip_serializing_if = "Option::is_none")]
    placement: Option<SlotPath>,
    history: Vec<StateTransition>,

    created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    allocated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    occupied_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    released_at: Option<DateTime<Utc>>,
    /// When the request was cancelled, expired or rejected
    #[serde(skip_serializing_if = "Option::is_none")]
    closed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    notes: String,
}

impl Request {
    /// Create a request with default priority, no zone preference and
    /// cross-zone fallback enabled.
    pub fn new(requester: impl Into<RequesterRef>) -> Self {
        Self {
            id: RequestId::generate(),
            requester: requester.into(),
            preferred_zone: None,
            priority: RequestPriority::Normal,
            requested_duration: None,
            cross_zone_fallback: true,
            slot_type: None,
            state: RequestState::Requested,
            placement: None,
            history: Vec::new(),
            created_at: Utc::now(),
            allocated_at: None,
            occupied_at: None,
            released_at: None,
            closed_at: None,
            notes: String::new(),
        }
    }

    pub fn with_id(mut self, id: RequestId) -> Self {
        self.id = id;
        self
    }

    pub fn with_preferred_zone(mut self, zone: ZoneId) -> Self {
        self.preferred_zone = Some(zone);
        self
    }

    pub fn with_priority(mut self, priority: RequestPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.requested_duration = Some(duration);
        self
    }

    pub fn with_fallback(mut self, allow: bool) -> Self {
        self.cross_zone_fallback = allow;
        self
    }

    /// Only place this request on slots of the given type
    pub fn with_slot_type(mut self, slot_type: SlotType) -> Self {
        self.slot_type = Some(slot_type);
        self
    }

    /// Override the creation timestamp (replaying or importing requests).
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn id(&self) -> &RequestId {
        &self.id
    }

    pub fn requester(&self) -> &RequesterRef {
        &self.requester
    }

    pub fn preferred_zone(&self) -> Option<&ZoneId> {
        self.preferred_zone.as_ref()
    }

    pub fn priority(&self) -> RequestPriority {
        self.priority
    }

    pub fn requested_duration(&self) -> Option<Duration> {
        self.requested_duration
    }

    pub fn allows_fallback(&self) -> bool {
        self.cross_zone_fallback
    }

    pub fn slot_type(&self) -> Option<SlotType> {
        self.slot_type
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Where the request was placed. `Some` from allocation onwards.
    pub fn placement(&self) -> Option<&SlotPath> {
        self.placement.as_ref()
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.history
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn allocated_at(&self) -> Option<DateTime<Utc>> {
        self.allocated_at
    }

    pub fn occupied_at(&self) -> Option<DateTime<Utc>> {
        self.occupied_at
    }

    pub fn released_at(&self) -> Option<DateTime<Utc>> {
        self.released_at
    }

    pub fn closed_at(&self) -> Option<DateTime<Utc>> {
        self.closed_at
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    // ── State machine ────────────────────────────────────────────────

    pub fn can_transition_to(&self, next: RequestState) -> bool {
        self.state.can_transition_to(next)
    }

    /// Check a transition without applying it.
    pub fn check_transition(&self, next: RequestState) -> AllocationResult<()> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(AllocationError::InvalidTransition {
                request: self.id.clone(),
                from: self.state,
                to: next,
            })
        }
    }

    /// REQUESTED → ALLOCATED, recording where the request was placed
    pub fn allocate(&mut self, path: SlotPath) -> AllocationResult<()> {
        let reason = format!("Allocated slot {}", path.slot_id);
        let at = self.transition(RequestState::Allocated, reason)?;
        self.placement = Some(path);
        self.allocated_at = Some(at);
        Ok(())
    }

    /// ALLOCATED → OCCUPIED
    pub fn occupy(&mut self) -> AllocationResult<()> {
        let at = self.transition(RequestState::Occupied, "Requester entered slot")?;
        self.occupied_at = Some(at);
        Ok(())
    }

    /// OCCUPIED → RELEASED
    pub fn release(&mut self) -> AllocationResult<()> {
        let at = self.transition(RequestState::Released, "Requester left slot")?;
        self.released_at = Some(at);
        Ok(())
    }

    pub fn cancel(&mut self, reason: impl Into<String>) -> AllocationResult<()> {
        let at = self.transition(RequestState::Cancelled, reason)?;
        self.closed_at = Some(at);
        Ok(())
    }

    pub fn reject(&mut self, reason: impl Into<String>) -> AllocationResult<()> {
        let at = self.transition(RequestState::Rejected, reason)?;
        self.closed_at = Some(at);
        Ok(())
    }

    pub fn expire(&mut self) -> AllocationResult<()> {
        let at = self.transition(RequestState::Expired, "Request expired")?;
        self.closed_at = Some(at);
        Ok(())
    }

    // ── Query methods ────────────────────────────────────────────────

    /// Not yet in a terminal state
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Waiting for placement
    pub fn is_pending(&self) -> bool {
        self.state == RequestState::Requested
    }

    /// Time from creation to allocation
    pub fn wait_time(&self) -> Option<chrono::Duration> {
        self.allocated_at.map(|at| at - self.created_at)
    }

    /// Time spent in the slot; measured up to now while still occupied
    pub fn occupancy_duration(&self) -> Option<chrono::Duration> {
        let occupied_at = self.occupied_at?;
        let end = self.released_at.unwrap_or_else(Utc::now);
        Some(end - occupied_at)
    }

    /// Creation followed by every recorded transition
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        let mut timeline = Vec::with_capacity(self.history.len() + 1);
        timeline.push(TimelineEntry {
            state: RequestState::Requested,
            at: self.created_at,
            reason: None,
        });
        timeline.extend(self.history.iter().map(|t| TimelineEntry {
            state: t.to,
            at: t.at,
            reason: Some(t.reason.clone()),
        }));
        timeline
    }

    /// Queue order: higher priority first, then earlier creation.
    ///
    /// `Ordering::Less` means `self` is served before `other`.
    pub fn queue_order(&self, other: &Request) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.created_at.cmp(&other.created_at))
    }

    /// Strictly ahead of `other` in queue order
    pub fn ranks_before(&self, other: &Request) -> bool {
        self.queue_order(other) == Ordering::Less
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn transition(
        &mut self,
        next: RequestState,
        reason: impl Into<String>,
    ) -> AllocationResult<DateTime<Utc>> {
        self.check_transition(next)?;
        let at = Utc::now();
        self.history.push(StateTransition {
            from: self.state,
            to: next,
            at,
            reason: reason.into(),
        });
        self.state = next;
        Ok(at)
    }
}

/// One point on a request's timeline
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub state: RequestState,
    pub at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AreaId, SlotId};

    fn path() -> SlotPath {
        SlotPath::new(ZoneId::new("Z1"), AreaId::new("A1"), SlotId::new("A1-S001"))
    }

    #[test]
    fn new_request_defaults() {
        let req = Request::new("V-ABC123");
        assert_eq!(req.state(), RequestState::Requested);
        assert_eq!(req.priority(), RequestPriority::Normal);
        assert!(req.allows_fallback());
        assert!(req.placement().is_none());
        assert!(req.history().is_empty());
        assert!(req.is_pending());
    }

    #[test]
    fn full_lifecycle_records_history() {
        let mut req = Request::new("V-1");
        req.allocate(path()).unwrap();
        req.occupy().unwrap();
        req.release().unwrap();

        assert_eq!(req.state(), RequestState::Released);
        assert_eq!(req.history().len(), 3);
        assert_eq!(req.history()[0].from, RequestState::Requested);
        assert_eq!(req.history()[0].to, RequestState::Allocated);
        assert_eq!(req.history()[0].reason, "Allocated slot A1-S001");
        assert_eq!(req.history()[2].to, RequestState::Released);
        // placement survives release
        assert_eq!(req.placement(), Some(&path()));
        assert!(req.wait_time().unwrap() >= chrono::Duration::zero());
        assert!(req.occupancy_duration().unwrap() >= chrono::Duration::zero());
    }

    #[test]
    fn invalid_transition_leaves_request_untouched() {
        let mut req = Request::new("V-1");
        req.allocate(path()).unwrap();
        req.occupy().unwrap();

        let err = req.cancel("changed my mind").unwrap_err();
        assert!(matches!(
            err,
            AllocationError::InvalidTransition {
                from: RequestState::Occupied,
                to: RequestState::Cancelled,
                ..
            }
        ));
        assert_eq!(req.state(), RequestState::Occupied);
        assert_eq!(req.history().len(), 2);
        assert!(req.closed_at().is_none());
    }

    #[test]
    fn released_is_terminal() {
        let mut req = Request::new("V-1");
        req.allocate(path()).unwrap();
        req.occupy().unwrap();
        req.release().unwrap();

        assert!(req.occupy().is_err());
        assert!(req.release().is_err());
        assert!(req.cancel("late").is_err());
        assert!(req.expire().is_err());
        assert!(req.allocate(path()).is_err());
        assert_eq!(req.history().len(), 3);
    }

    #[test]
    fn rejected_request_has_no_placement() {
        let mut req = Request::new("V-1");
        req.reject("no slot available").unwrap();
        assert_eq!(req.state(), RequestState::Rejected);
        assert!(req.placement().is_none());
        assert!(req.closed_at().is_some());
        assert!(req.allocate(path()).is_err());
        assert!(req.placement().is_none());
    }

    #[test]
    fn durations_absent_without_timestamps() {
        let req = Request::new("V-1");
        assert!(req.wait_time().is_none());
        assert!(req.occupancy_duration().is_none());
    }

    #[test]
    fn queue_order_priority_then_age() {
        let t0 = Utc::now();
        let older = Request::new("a").with_created_at(t0);
        let newer = Request::new("b").with_created_at(t0 + chrono::Duration::seconds(1));
        let urgent = Request::new("c")
            .with_priority(RequestPriority::High)
            .with_created_at(t0 + chrono::Duration::seconds(2));

        assert!(urgent.ranks_before(&older));
        assert!(older.ranks_before(&newer));
        assert!(!newer.ranks_before(&older));

        let twin = Request::new("d").with_created_at(t0);
        assert!(!twin.ranks_before(&older));
        assert!(!older.ranks_before(&twin));
    }

    #[test]
    fn timeline_starts_with_creation() {
        let mut req = Request::new("V-1");
        req.expire().unwrap();
        let timeline = req.timeline();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].state, RequestState::Requested);
        assert!(timeline[0].reason.is_none());
        assert_eq!(timeline[1].state, RequestState::Expired);
        assert_eq!(timeline[1].reason.as_deref(), Some("Request expired"));
    }

    #[test]
    fn serializes_to_json() {
        let req = Request::new("V-1")
            .with_preferred_zone(ZoneId::new("Z1"))
            .with_slot_type(SlotType::Electric);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["state"], "requested");
        assert_eq!(json["preferred_zone"], "Z1");
        assert_eq!(json["slot_type"], "electric");
        assert!(json.get("placement").is_none());
    }
}
