//! Process control blocks and the process table.
//!
//! The table is densely indexed: a process's ID equals its index, slots are
//! allocated by appending and are never freed during a run. Terminated
//! processes stay in the table so the state dump and the turnaround
//! statistics can refer to them.

use std::fmt;
use std::ops::{Index, IndexMut};

use crate::instruction::Instruction;
use crate::types::{Pid, Priority, Timestamp};

/// The lifecycle state of a simulated process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    /// Runnable, waiting in the ready queue.
    Ready,
    /// Currently bound to the CPU.
    Running,
    /// Waiting in the blocked queue for an unblock.
    Blocked,
    /// Finished. Stays in the table, belongs to no queue.
    Terminated,
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcState::Ready => "READY",
            ProcState::Running => "RUNNING",
            ProcState::Blocked => "BLOCKED",
            ProcState::Terminated => "TERMINATED",
        };
        f.write_str(name)
    }
}

/// Per-process record: scheduling metadata plus the execution snapshot taken
/// at the last context switch.
///
/// While the process is running, the CPU's program counter, accumulator, and
/// slice-used counter are authoritative and the copies here are stale; they
/// are written back on every switch off the CPU.
#[derive(Debug, Clone)]
pub struct PcbEntry {
    pub process_id: Pid,
    /// `None` for the initial process.
    pub parent: Option<Pid>,
    /// The process's program, owned by this entry.
    pub program: Vec<Instruction>,
    pub program_counter: usize,
    pub value: i64,
    pub priority: Priority,
    pub state: ProcState,
    /// Timestamp at which the process was created.
    pub start_time: Timestamp,
    /// Cumulative quanta consumed across all completed runs.
    pub time_used: u32,
}

/// Dense, growable table of every process created during the run.
#[derive(Debug, Default)]
pub struct PcbTable {
    entries: Vec<PcbEntry>,
}

impl PcbTable {
    pub fn new() -> Self {
        PcbTable::default()
    }

    /// The process ID the next [`push`] will assign.
    ///
    /// [`push`]: PcbTable::push
    pub fn next_pid(&self) -> Pid {
        Pid(self.entries.len() as u32)
    }

    /// Append a new entry. The entry's `process_id` must be [`next_pid`];
    /// IDs and table indices stay in lockstep by construction.
    ///
    /// [`next_pid`]: PcbTable::next_pid
    pub fn push(&mut self, entry: PcbEntry) -> Pid {
        assert_eq!(
            entry.process_id,
            self.next_pid(),
            "process IDs must be allocated densely"
        );
        let pid = entry.process_id;
        self.entries.push(entry);
        pid
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in process-ID order.
    pub fn iter(&self) -> impl Iterator<Item = &PcbEntry> {
        self.entries.iter()
    }
}

impl Index<Pid> for PcbTable {
    type Output = PcbEntry;

    fn index(&self, pid: Pid) -> &PcbEntry {
        &self.entries[pid.0 as usize]
    }
}

impl IndexMut<Pid> for PcbTable {
    fn index_mut(&mut self, pid: Pid) -> &mut PcbEntry {
        &mut self.entries[pid.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(pid: Pid) -> PcbEntry {
        PcbEntry {
            process_id: pid,
            parent: None,
            program: vec![Instruction::End],
            program_counter: 0,
            value: 0,
            priority: Priority::MOST_FAVORED,
            state: ProcState::Ready,
            start_time: 0,
            time_used: 0,
        }
    }

    #[test]
    fn test_ids_equal_indices() {
        let mut table = PcbTable::new();
        for i in 0..4u32 {
            assert_eq!(table.next_pid(), Pid(i));
            let pid = table.push(entry(Pid(i)));
            assert_eq!(pid, Pid(i));
        }
        assert_eq!(table.len(), 4);
        assert_eq!(table[Pid(2)].process_id, Pid(2));
    }

    #[test]
    fn test_table_grows_past_ten() {
        // The table must not be capped at a fixed size: forks may keep
        // succeeding as long as memory allows.
        let mut table = PcbTable::new();
        for i in 0..64u32 {
            table.push(entry(Pid(i)));
        }
        assert_eq!(table.len(), 64);
        assert_eq!(table[Pid(63)].process_id, Pid(63));
    }

    #[test]
    #[should_panic(expected = "allocated densely")]
    fn test_push_rejects_sparse_ids() {
        let mut table = PcbTable::new();
        table.push(entry(Pid(1)));
    }
}
