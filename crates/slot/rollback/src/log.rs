//! Bounded operation log.

use std::collections::VecDeque;

use crate::Operation;

pub const DEFAULT_CAPACITY: usize = 100;

/// Operations oldest-first; the oldest is evicted once over capacity.
#[derive(Clone, Debug)]
pub struct OperationLog {
    entries: VecDeque<Operation>,
    capacity: usize,
}

impl OperationLog {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity,
        }
    }

    /// Append, returning the evicted oldest entry if the log was full.
    pub fn push(&mut self, operation: Operation) -> Option<Operation> {
        self.entries.push_back(operation);
        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    pub fn pop(&mut self) -> Option<Operation> {
        self.entries.pop_back()
    }

    /// Remove up to `k` entries, newest first.
    pub fn pop_k(&mut self, k: usize) -> Vec<Operation> {
        let n = k.min(self.entries.len());
        let mut popped = Vec::with_capacity(n);
        for _ in 0..n {
            if let Some(op) = self.entries.pop_back() {
                popped.push(op);
            }
        }
        popped
    }

    pub fn peek(&self) -> Option<&Operation> {
        self.entries.back()
    }

    /// Up to `k` entries, newest first, without removing them.
    pub fn peek_k(&self, k: usize) -> Vec<&Operation> {
        self.entries.iter().rev().take(k).collect()
    }

    /// Oldest first
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Operation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for OperationLog {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
