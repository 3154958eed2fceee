//! Rollback result summaries.

use crate::{Operation, RollbackError};

/// An operation whose reversal handler failed
#[derive(Clone, Debug)]
pub struct RollbackFailure {
    pub operation: Operation,
    pub error: RollbackError,
}

/// Outcome of one `rollback_k` call.
///
/// Every popped operation lands in exactly one of `rolled_back` or
/// `failures`; none is returned to the log.
#[derive(Clone, Debug, Default)]
pub struct RollbackReport {
    /// The `k` the caller asked for
    pub requested: usize,
    /// Reversed operations, newest first, flagged rolled back
    pub rolled_back: Vec<Operation>,
    pub failures: Vec<RollbackFailure>,
}

impl RollbackReport {
    pub(crate) fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Default::default()
        }
    }

    /// Operations popped from the log
    pub fn attempted(&self) -> usize {
        self.rolled_back.len() + self.failures.len()
    }

    pub fn rolled_back_count(&self) -> usize {
        self.rolled_back.len()
    }

    /// All popped operations were reversed
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn errors(&self) -> Vec<String> {
        self.failures
            .iter()
            .map(|f| format!("{}: {}", f.operation, f.error))
            .collect()
    }

    pub fn message(&self) -> String {
        if self.success() {
            format!("Rolled back {} operation(s)", self.rolled_back.len())
        } else {
            format!(
                "Rolled back {} of {} operation(s), {} failed",
                self.rolled_back.len(),
                self.attempted(),
                self.failures.len()
            )
        }
    }
}
