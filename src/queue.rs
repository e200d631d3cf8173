//! Priority-ordered run queues.
//!
//! Both the ready and the blocked queue are instances of [`RunQueue`]: a
//! min-queue keyed by `(priority, pid)`. The most favored (lowest) priority
//! is extracted first; ties go to the lower process ID. Each entry snapshots
//! the priority at insertion time; every priority change in the scheduler is
//! paired with a fresh enqueue, so stored keys never go stale.

use std::collections::BTreeSet;

use crate::types::{Pid, Priority};

/// A queued process with its priority at enqueue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueEntry {
    pub priority: Priority,
    pub pid: Pid,
}

/// Min-priority queue over `(priority, pid)`.
#[derive(Debug, Default)]
pub struct RunQueue {
    entries: BTreeSet<(Priority, Pid)>,
}

impl RunQueue {
    pub fn new() -> Self {
        RunQueue::default()
    }

    /// Enqueue a process under the given priority.
    pub fn push(&mut self, pid: Pid, priority: Priority) {
        let inserted = self.entries.insert((priority, pid));
        debug_assert!(inserted, "process {pid} enqueued twice");
    }

    /// The most favored entry without removing it.
    pub fn peek(&self) -> Option<QueueEntry> {
        self.entries
            .first()
            .map(|&(priority, pid)| QueueEntry { priority, pid })
    }

    /// Remove and return the most favored entry.
    pub fn pop(&mut self) -> Option<QueueEntry> {
        self.entries
            .pop_first()
            .map(|(priority, pid)| QueueEntry { priority, pid })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the process appears in this queue.
    pub fn contains(&self, pid: Pid) -> bool {
        self.entries.iter().any(|&(_, p)| p == pid)
    }

    /// All entries in extraction order.
    pub fn iter(&self) -> impl Iterator<Item = QueueEntry> + '_ {
        self.entries
            .iter()
            .map(|&(priority, pid)| QueueEntry { priority, pid })
    }
}
