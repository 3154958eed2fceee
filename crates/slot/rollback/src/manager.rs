//! Rollback manager: records operations and reverses the most recent ones.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::log::{OperationLog, DEFAULT_CAPACITY};
use crate::{
    EntityRef, Operation, OperationId, OperationType, RollbackError, RollbackFailure,
    RollbackReport, RollbackResult, Snapshot,
};

// ── Reversal handler ─────────────────────────────────────────────────

/// Undoes one operation against a context `C` (typically the live system
/// state).
pub type ReversalHandler<C> =
    Box<dyn Fn(&Operation, &mut C) -> RollbackResult<()> + Send + Sync>;

// ── Manager ──────────────────────────────────────────────────────────

/// Bounded history of operations plus a handler registry keyed by type.
pub struct RollbackManager<C: ?Sized> {
    log: OperationLog,
    handlers: HashMap<OperationType, ReversalHandler<C>>,
    recording: bool,
    next_id: u64,
}

impl<C: ?Sized> RollbackManager<C> {
    pub fn new(capacity: usize) -> Self {
        Self {
            log: OperationLog::new(capacity),
            handlers: HashMap::new(),
            recording: true,
            next_id: 1,
        }
    }

    // ── Handlers ─────────────────────────────────────────────────────

    /// Register (or replace) the reversal for one operation type.
    pub fn register_handler<F>(&mut self, op_type: OperationType, handler: F)
    where
        F: Fn(&Operation, &mut C) -> RollbackResult<()> + Send + Sync + 'static,
    {
        self.handlers.insert(op_type, Box::new(handler));
    }

    pub fn with_handler<F>(mut self, op_type: OperationType, handler: F) -> Self
    where
        F: Fn(&Operation, &mut C) -> RollbackResult<()> + Send + Sync + 'static,
    {
        self.register_handler(op_type, handler);
        self
    }

    pub fn has_handler(&self, op_type: OperationType) -> bool {
        self.handlers.contains_key(&op_type)
    }

    // ── Recording ────────────────────────────────────────────────────

    /// Append an operation. Returns `None` without recording while paused.
    pub fn record(
        &mut self,
        op_type: OperationType,
        entity: EntityRef,
        before: Snapshot,
        after: Snapshot,
        related: Vec<EntityRef>,
    ) -> Option<OperationId> {
        if !self.recording {
            return None;
        }
        let id = OperationId(self.next_id);
        self.next_id += 1;

        debug!(operation = %id, op_type = %op_type, entity = %entity, "Operation recorded");
        if let Some(evicted) = self
            .log
            .push(Operation::new(id, op_type, entity, before, after, related))
        {
            debug!(operation = %evicted.id(), "Oldest operation evicted");
        }
        Some(id)
    }

    pub fn pause_recording(&mut self) {
        self.recording = false;
    }

    pub fn resume_recording(&mut self) {
        self.recording = true;
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    // ── Rollback ─────────────────────────────────────────────────────

    pub fn rollback_last(&mut self, ctx: &mut C) -> RollbackResult<RollbackReport> {
        self.rollback_k(1, ctx)
    }

    /// Reverse up to `k` most recent operations, newest first.
    ///
    /// Recording is paused for the duration so handlers that go through
    /// recorded APIs leave no trace, and switched back on afterwards
    /// whatever the handlers returned, even if it was paused before. Popped operations never return to the log; a
    /// failed reversal is reported and the next operation is still tried.
    pub fn rollback_k(&mut self, k: usize, ctx: &mut C) -> RollbackResult<RollbackReport> {
        if k == 0 {
            return Err(RollbackError::InvalidCount(k));
        }
        if self.log.is_empty() {
            return Err(RollbackError::EmptyHistory);
        }

        self.recording = false;

        let mut report = RollbackReport::new(k);
        for mut operation in self.log.pop_k(k) {
            match self.reverse(&operation, ctx) {
                Ok(()) => {
                    operation.mark_rolled_back();
                    report.rolled_back.push(operation);
                }
                Err(error) => {
                    warn!(operation = %operation, error = %error, "Reversal failed");
                    report.failures.push(RollbackFailure { operation, error });
                }
            }
        }

        self.recording = true;
        info!(
            requested = k,
            rolled_back = report.rolled_back.len(),
            failed = report.failures.len(),
            "Rollback finished"
        );
        Ok(report)
    }

    fn reverse(&self, operation: &Operation, ctx: &mut C) -> RollbackResult<()> {
        match self.handlers.get(&operation.op_type()) {
            Some(handler) => handler(operation, ctx),
            None => {
                debug!(operation = %operation, "No handler registered; nothing to reverse");
                Ok(())
            }
        }
    }

    pub fn can_rollback(&self) -> bool {
        !self.log.is_empty()
    }

    // ── History ──────────────────────────────────────────────────────

    pub fn last_operation(&self) -> Option<&Operation> {
        self.log.peek()
    }

    /// Up to `k` most recent operations, newest first
    pub fn last_k_operations(&self, k: usize) -> Vec<&Operation> {
        self.log.peek_k(k)
    }

    /// Every retained operation, oldest first
    pub fn history(&self) -> Vec<&Operation> {
        self.log.iter().collect()
    }

    pub fn history_len(&self) -> usize {
        self.log.len()
    }

    pub fn capacity(&self) -> usize {
        self.log.capacity()
    }

    pub fn clear_history(&mut self) {
        self.log.clear();
    }

    pub fn stats(&self) -> RollbackStats {
        let mut by_type = BTreeMap::new();
        for op in self.log.iter() {
            *by_type.entry(op.op_type()).or_insert(0) += 1;
        }
        RollbackStats {
            total_operations: self.log.len(),
            capacity: self.log.capacity(),
            recording: self.recording,
            can_rollback: self.can_rollback(),
            by_type,
        }
    }
}

impl<C: ?Sized> Default for RollbackManager<C> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl<C: ?Sized> std::fmt::Debug for RollbackManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut handlers: Vec<_> = self.handlers.keys().collect();
        handlers.sort();
        f.debug_struct("RollbackManager")
            .field("history", &self.log.len())
            .field("capacity", &self.log.capacity())
            .field("recording", &self.recording)
            .field("handlers", &handlers)
            .finish()
    }
}

/// Snapshot of the log for reporting
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RollbackStats {
    pub total_operations: usize,
    pub capacity: usize,
    pub recording: bool,
    pub can_rollback: bool,
    pub by_type: BTreeMap<OperationType, usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityKind;

    /// Toy context: a counter and a log of reversed entity ids
    #[derive(Default)]
    struct Counter {
        value: i64,
        reversed: Vec<String>,
    }

    fn manager() -> RollbackManager<Counter> {
        RollbackManager::new(10)
            .with_handler(OperationType::SlotReserve, |op: &Operation, ctx: &mut Counter| {
                ctx.value -= 1;
                ctx.reversed.push(op.entity_id().to_string());
                Ok(())
            })
            .with_handler(OperationType::RequestRelease, |op: &Operation, _: &mut Counter| {
                Err(RollbackError::handler(format!(
                    "request {} already released",
                    op.entity_id()
                )))
            })
    }

    fn reserve(
        m: &mut RollbackManager<Counter>,
        ctx: &mut Counter,
        id: &str,
    ) -> Option<OperationId> {
        ctx.value += 1;
        m.record(
            OperationType::SlotReserve,
            EntityRef::slot(id),
            Snapshot::empty(),
            Snapshot::empty(),
            vec![EntityRef::new(EntityKind::Request, "R1")],
        )
    }

    #[test]
    fn record_assigns_increasing_ids() {
        let mut m = manager();
        let mut ctx = Counter::default();
        let a = reserve(&mut m, &mut ctx, "S1").unwrap();
        let b = reserve(&mut m, &mut ctx, "S2").unwrap();
        assert!(b > a);
        assert_eq!(m.last_operation().unwrap().id(), b);
        assert_eq!(m.history_len(), 2);
    }

    #[test]
    fn paused_recording_is_a_no_op() {
        let mut m = manager();
        let mut ctx = Counter::default();
        m.pause_recording();
        assert!(reserve(&mut m, &mut ctx, "S1").is_none());
        assert!(!m.can_rollback());
        m.resume_recording();
        assert!(reserve(&mut m, &mut ctx, "S1").is_some());
    }

    #[test]
    fn rollback_last_runs_handler() {
        let mut m = manager();
        let mut ctx = Counter::default();
        reserve(&mut m, &mut ctx, "S1");
        reserve(&mut m, &mut ctx, "S2");

        let report = m.rollback_last(&mut ctx).unwrap();
        assert!(report.success());
        assert_eq!(report.rolled_back_count(), 1);
        assert!(report.rolled_back[0].is_rolled_back());
        assert_eq!(ctx.value, 1);
        assert_eq!(ctx.reversed, vec!["S2"]);
        assert_eq!(m.history_len(), 1);
        assert!(m.is_recording());
    }

    #[test]
    fn rollback_k_pops_k_regardless_of_failures() {
        let mut m = manager();
        let mut ctx = Counter::default();
        reserve(&mut m, &mut ctx, "S1");
        reserve(&mut m, &mut ctx, "S2");
        reserve(&mut m, &mut ctx, "S3");
        m.record(
            OperationType::RequestRelease,
            EntityRef::request("R1"),
            Snapshot::empty(),
            Snapshot::empty(),
            Vec::new(),
        );
        reserve(&mut m, &mut ctx, "S4");

        let report = m.rollback_k(2, &mut ctx).unwrap();
        assert_eq!(m.history_len(), 3);
        assert_eq!(report.attempted(), 2);
        assert_eq!(report.rolled_back_count(), 1);
        assert!(!report.success());
        assert_eq!(report.errors().len(), 1);
        assert!(report.errors()[0].contains("already released"));
        assert_eq!(ctx.reversed, vec!["S4"]);
        assert!(m.is_recording());
    }

    #[test]
    fn rollback_more_than_history() {
        let mut m = manager();
        let mut ctx = Counter::default();
        reserve(&mut m, &mut ctx, "S1");
        let report = m.rollback_k(5, &mut ctx).unwrap();
        assert_eq!(report.requested, 5);
        assert_eq!(report.attempted(), 1);
        assert!(!m.can_rollback());
    }

    #[test]
    fn unhandled_type_is_marked_rolled_back() {
        let mut m = manager();
        let mut ctx = Counter::default();
        m.record(
            OperationType::ZoneCreate,
            EntityRef::zone("Z1"),
            Snapshot::empty(),
            Snapshot::empty(),
            Vec::new(),
        );
        let report = m.rollback_last(&mut ctx).unwrap();
        assert!(report.success());
        assert!(report.rolled_back[0].is_rolled_back());
        assert_eq!(ctx.value, 0);
    }

    #[test]
    fn invalid_arguments() {
        let mut m = manager();
        let mut ctx = Counter::default();
        assert_eq!(m.rollback_k(1, &mut ctx).unwrap_err(), RollbackError::EmptyHistory);
        reserve(&mut m, &mut ctx, "S1");
        assert_eq!(
            m.rollback_k(0, &mut ctx).unwrap_err(),
            RollbackError::InvalidCount(0)
        );
        assert_eq!(m.history_len(), 1);
    }

    #[test]
    fn rollback_resumes_paused_recording() {
        let mut m: RollbackManager<Vec<bool>> = RollbackManager::new(4);
        m.register_handler(OperationType::SlotOccupy, |_: &Operation, seen: &mut Vec<bool>| {
            seen.push(true);
            Ok(())
        });
        m.record(
            OperationType::SlotOccupy,
            EntityRef::slot("S1"),
            Snapshot::empty(),
            Snapshot::empty(),
            Vec::new(),
        );
        m.pause_recording();
        let mut seen = Vec::new();
        m.rollback_last(&mut seen).unwrap();
        assert!(m.is_recording());
        assert_eq!(seen, vec![true]);
        assert!(m
            .record(
                OperationType::SlotOccupy,
                EntityRef::slot("S2"),
                Snapshot::empty(),
                Snapshot::empty(),
                Vec::new(),
            )
            .is_some());
    }

    #[test]
    fn stats_count_by_type() {
        let mut m = manager();
        let mut ctx = Counter::default();
        reserve(&mut m, &mut ctx, "S1");
        reserve(&mut m, &mut ctx, "S2");
        let stats = m.stats();
        assert_eq!(stats.total_operations, 2);
        assert_eq!(stats.capacity, 10);
        assert_eq!(stats.by_type.get(&OperationType::SlotReserve), Some(&2));
        assert!(stats.can_rollback);

        let peeked: Vec<_> = m.last_k_operations(5).iter().map(|o| o.entity_id()).collect();
        assert_eq!(peeked, vec!["S2", "S1"]);
        m.clear_history();
        assert_eq!(m.history_len(), 0);
    }
}
