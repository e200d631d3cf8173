//! Point-in-time snapshot of the whole simulation state.
//!
//! The `P` command renders one of these. The snapshot is assembled between
//! commands on the manager's own thread, so it always observes a consistent
//! state; its `Display` output is a pure function of that state.

use std::fmt;

use crate::pcb::ProcState;
use crate::queue::QueueEntry;
use crate::types::{Pid, Timestamp};

/// One row of the process table as captured in a snapshot.
///
/// For the running process the row carries the live CPU values (program
/// counter, accumulator) and its `time_used` includes the quanta consumed in
/// the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessRow {
    pub pid: Pid,
    pub parent: Option<Pid>,
    pub program_counter: usize,
    pub program_len: usize,
    pub value: i64,
    pub priority: u8,
    pub state: ProcState,
    pub start_time: Timestamp,
    pub time_used: u32,
}

/// A consistent capture of clock, CPU binding, queues, and the full process
/// table.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub timestamp: Timestamp,
    pub running: Option<Pid>,
    /// Blocked processes in extraction (priority) order.
    pub blocked: Vec<QueueEntry>,
    /// Ready processes in extraction (priority) order.
    pub ready: Vec<QueueEntry>,
    /// Every process ever created, in process-ID order.
    pub processes: Vec<ProcessRow>,
}

fn write_queue(f: &mut fmt::Formatter<'_>, label: &str, entries: &[QueueEntry]) -> fmt::Result {
    write!(f, " {label}")?;
    if entries.is_empty() {
        return writeln!(f, " (empty)");
    }
    for entry in entries {
        write!(f, " [pid={} prio={}]", entry.pid, entry.priority)?;
    }
    writeln!(f)
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "==================================================")?;
        writeln!(f, " SYSTEM STATE AT TIME {}", self.timestamp)?;
        writeln!(f, "==================================================")?;
        match self.running {
            Some(pid) => writeln!(f, " RUNNING: pid={pid}")?,
            None => writeln!(f, " RUNNING: none")?,
        }
        write_queue(f, "BLOCKED:", &self.blocked)?;
        write_queue(f, "READY:  ", &self.ready)?;
        writeln!(f)?;
        writeln!(
            f,
            " {:<5} {:<5} {:<6} {:<8} {:<5} {:<11} {:<6} {:<5}",
            "PID", "PPID", "PC", "VALUE", "PRIO", "STATE", "START", "USED"
        )?;
        for row in &self.processes {
            let ppid = match row.parent {
                Some(pid) => pid.0 as i64,
                None => -1,
            };
            writeln!(
                f,
                " {:<5} {:<5} {:<6} {:<8} {:<5} {:<11} {:<6} {:<5}",
                row.pid.0,
                ppid,
                format!("{}/{}", row.program_counter, row.program_len),
                row.value,
                row.priority,
                row.state.to_string(),
                row.start_time,
                row.time_used
            )?;
        }
        writeln!(f, "==================================================")
    }
}
