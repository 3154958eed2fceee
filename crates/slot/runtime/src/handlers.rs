//! Reversal handlers for every recorded operation type.
//!
//! | Operation        | Reversal                                          |
//! |------------------|---------------------------------------------------|
//! | SlotReserve      | drop the reservation                              |
//! | SlotOccupy       | release the walk-in occupant                      |
//! | SlotRelease      | put the previous walk-in occupant back            |
//! | RequestCreate    | cancel the request while it is still cancellable  |
//! | RequestAllocate  | cancel the request, freeing its reservation       |
//! | RequestOccupy    | release the request                               |
//! | RequestRelease   | refused: released requests cannot reopen          |
//! | RequestCancel    | refused: cancelled requests cannot reopen         |
//! | RequestExpire    | refused: expired requests cannot reopen           |
//! | ZoneCreate       | remove the zone unless a slot in it is held       |
//! | AreaCreate       | remove the area unless a slot in it is held       |

use slot_rollback::{
    EntityKind, Operation, OperationType, RollbackError, RollbackManager, RollbackResult,
};
use slot_topology::Topology;
use slot_types::{AreaId, RequestId, RequestState, RequesterRef, SlotId, SlotPath, ZoneId};

use crate::SystemState;

pub const ROLLBACK_REASON: &str = "Rolled back";

/// A manager with every handler registered.
pub fn rollback_manager(capacity: usize) -> RollbackManager<SystemState> {
    RollbackManager::new(capacity)
        .with_handler(OperationType::SlotReserve, undo_slot_reserve)
        .with_handler(OperationType::SlotOccupy, undo_slot_occupy)
        .with_handler(OperationType::SlotRelease, undo_slot_release)
        .with_handler(OperationType::RequestCreate, undo_request_create)
        .with_handler(OperationType::RequestAllocate, undo_request_allocate)
        .with_handler(OperationType::RequestOccupy, undo_request_occupy)
        .with_handler(OperationType::RequestRelease, refuse_terminal)
        .with_handler(OperationType::RequestCancel, refuse_terminal)
        .with_handler(OperationType::RequestExpire, refuse_terminal)
        .with_handler(OperationType::ZoneCreate, undo_zone_create)
        .with_handler(OperationType::AreaCreate, undo_area_create)
}

fn failed(e: impl std::fmt::Display) -> RollbackError {
    RollbackError::handler(e.to_string())
}

/// Rebuild the path of the slot an operation targets.
fn slot_path(op: &Operation) -> RollbackResult<SlotPath> {
    let zone = op
        .related_id(EntityKind::Zone)
        .ok_or_else(|| failed(format!("{op}: missing zone reference")))?;
    let area = op
        .related_id(EntityKind::Area)
        .ok_or_else(|| failed(format!("{op}: missing area reference")))?;
    let slot = match op.entity().kind {
        EntityKind::Slot => op.entity_id(),
        _ => op
            .related_id(EntityKind::Slot)
            .ok_or_else(|| failed(format!("{op}: missing slot reference")))?,
    };
    Ok(SlotPath::new(
        ZoneId::new(zone),
        AreaId::new(area),
        SlotId::new(slot),
    ))
}

fn undo_slot_reserve(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let path = slot_path(op)?;
    let slot = state.topology.resolve_mut(&path).map_err(failed)?;
    if slot.cancel_reservation() {
        Ok(())
    } else {
        Err(failed(format!("slot {path} is no longer reserved")))
    }
}

fn undo_slot_occupy(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let path = slot_path(op)?;
    let slot = state.topology.resolve_mut(&path).map_err(failed)?;
    if !slot.is_occupied() {
        return Err(failed(format!("slot {path} is not occupied")));
    }
    if let Some(request) = &slot.request_id {
        return Err(failed(format!("slot {path} is now held by request {request}")));
    }
    slot.release();
    Ok(())
}

fn undo_slot_release(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let path = slot_path(op)?;
    let occupant = op
        .before()
        .get_str("occupant")
        .map(RequesterRef::new)
        .ok_or_else(|| failed(format!("{op}: no occupant recorded")))?;
    let slot = state.topology.resolve_mut(&path).map_err(failed)?;
    if slot.occupy(occupant, None) {
        Ok(())
    } else {
        Err(failed(format!("slot {path} is no longer free")))
    }
}

fn undo_request_create(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let id = RequestId::new(op.entity_id());
    let current = state
        .engine
        .lookup(&id)
        .map(|r| r.state())
        .ok_or_else(|| failed(format!("request {id} not found")))?;
    match current {
        RequestState::Requested | RequestState::Allocated => state
            .engine
            .cancel(&id, &mut state.topology, ROLLBACK_REASON)
            .map_err(failed),
        // already out of the system
        RequestState::Cancelled | RequestState::Rejected | RequestState::Expired => Ok(()),
        RequestState::Occupied | RequestState::Released => Err(failed(format!(
            "request {id} is {current} and cannot be withdrawn"
        ))),
    }
}

fn undo_request_allocate(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let id = RequestId::new(op.entity_id());
    state
        .engine
        .cancel(&id, &mut state.topology, ROLLBACK_REASON)
        .map_err(failed)
}

fn undo_request_occupy(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let id = RequestId::new(op.entity_id());
    state
        .engine
        .release(&id, &mut state.topology)
        .map_err(failed)?;
    state.requests_served += 1;
    Ok(())
}

fn refuse_terminal(op: &Operation, _: &mut SystemState) -> RollbackResult<()> {
    Err(failed(format!(
        "{} of request {} is final and cannot be reversed",
        op.op_type(),
        op.entity_id()
    )))
}

fn undo_zone_create(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    state
        .topology
        .remove_zone(&ZoneId::new(op.entity_id()))
        .map(|_| ())
        .map_err(failed)
}

fn undo_area_create(op: &Operation, state: &mut SystemState) -> RollbackResult<()> {
    let zone = op
        .related_id(EntityKind::Zone)
        .ok_or_else(|| failed(format!("{op}: missing zone reference")))?;
    state
        .topology
        .remove_area(&ZoneId::new(zone), &AreaId::new(op.entity_id()))
        .map(|_| ())
        .map_err(failed)
}
