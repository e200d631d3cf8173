//! The process manager: dispatcher, scheduler, and quantum interpreter.
//!
//! A single [`ProcessManager`] value owns every piece of simulation state
//! (process table, ready/blocked queues, CPU registers, clock, and turnaround
//! statistics) and is mutated only by the command handlers. One `Q` advances
//! the clock by exactly one quantum and executes at most one instruction;
//! time never advances on its own.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::cpu::Cpu;
use crate::instruction::Instruction;
use crate::pcb::{PcbEntry, PcbTable, ProcState};
use crate::program::{self, LoadError};
use crate::queue::RunQueue;
use crate::snapshot::{ProcessRow, Snapshot};
use crate::stats::TurnaroundStats;
use crate::types::{Pid, Priority, Timestamp};

/// The simulation core driven by operator commands.
pub struct ProcessManager {
    table: PcbTable,
    ready: RunQueue,
    blocked: RunQueue,
    cpu: Cpu,
    timestamp: Timestamp,
    running: Option<Pid>,
    stats: TurnaroundStats,
}

impl ProcessManager {
    /// Bootstrap with the initial process running the given program.
    ///
    /// Process 0 starts at the most favored priority, bound to the CPU, with
    /// the clock at zero.
    pub fn new(program: Vec<Instruction>) -> Self {
        let mut table = PcbTable::new();
        let pid = table.push(PcbEntry {
            process_id: Pid(0),
            parent: None,
            program,
            program_counter: 0,
            value: 0,
            priority: Priority::MOST_FAVORED,
            state: ProcState::Running,
            start_time: 0,
            time_used: 0,
        });

        let mut cpu = Cpu::new();
        cpu.bind(0, 0, Priority::MOST_FAVORED);
        info!(pid = pid.0, "running initial process");

        ProcessManager {
            table,
            ready: RunQueue::new(),
            blocked: RunQueue::new(),
            cpu,
            timestamp: 0,
            running: Some(pid),
            stats: TurnaroundStats::new(),
        }
    }

    /// Bootstrap from a program file (`init.txt` by convention).
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let program = program::load_program(path)?;
        Ok(ProcessManager::new(program))
    }

    pub fn timestamp(&self) -> Timestamp {
        self.timestamp
    }

    pub fn running(&self) -> Option<Pid> {
        self.running
    }

    pub fn table(&self) -> &PcbTable {
        &self.table
    }

    pub fn stats(&self) -> &TurnaroundStats {
        &self.stats
    }

    /// Mean turnaround over terminated processes, if any terminated.
    pub fn average_turnaround(&self) -> Option<f64> {
        self.stats.average()
    }

    /// Advance the system by exactly one quantum: fetch and execute one
    /// instruction of the running process, tick the clock, account the
    /// slice, and reschedule.
    ///
    /// With no process running only the clock advances; a non-empty ready
    /// queue is drained by the scheduler on the next quantum.
    pub fn quantum(&mut self) {
        let Some(pid) = self.running else {
            debug!(timestamp = self.timestamp, "no process running");
            self.timestamp += 1;
            return;
        };

        let instruction = self.fetch(pid);
        debug!(pid = pid.0, instruction = %instruction, "executing");
        match instruction {
            Instruction::Set(v) => {
                self.cpu.value = v;
                info!(pid = pid.0, value = v, "SET");
            }
            Instruction::Add(v) => {
                self.cpu.value = self.cpu.value.wrapping_add(v);
                info!(pid = pid.0, value = self.cpu.value, "ADD");
            }
            Instruction::Decrement(v) => {
                self.cpu.value = self.cpu.value.wrapping_sub(v);
                info!(pid = pid.0, value = self.cpu.value, "DECREMENT");
            }
            Instruction::Block => self.exec_block(pid),
            Instruction::End => self.exec_end(pid),
            Instruction::Fork(skip) => self.exec_fork(pid, skip),
            Instruction::Replace(filename) => self.exec_replace(pid, &filename),
        }

        self.timestamp += 1;
        self.cpu.time_slice_used += 1;
        self.schedule();

        #[cfg(debug_assertions)]
        self.check_consistency();
    }

    /// Move the most favored blocked process back to the ready queue and
    /// reschedule. No-op when nothing is blocked.
    pub fn unblock(&mut self) {
        let Some(entry) = self.blocked.pop() else {
            debug!("nothing to unblock");
            return;
        };

        let pcb = &mut self.table[entry.pid];
        pcb.state = ProcState::Ready;
        let priority = pcb.priority;
        self.ready.push(entry.pid, priority);
        info!(pid = entry.pid.0, priority = priority.level(), "UNBLOCKED");

        self.schedule();

        #[cfg(debug_assertions)]
        self.check_consistency();
    }

    /// Capture a consistent snapshot of clock, CPU binding, queues, and the
    /// full process table. The running process's row carries the live CPU
    /// program counter, accumulator, and slice-inclusive time used.
    pub fn snapshot(&self) -> Snapshot {
        let processes = self
            .table
            .iter()
            .map(|pcb| {
                let mut row = ProcessRow {
                    pid: pcb.process_id,
                    parent: pcb.parent,
                    program_counter: pcb.program_counter,
                    program_len: pcb.program.len(),
                    value: pcb.value,
                    priority: pcb.priority.level(),
                    state: pcb.state,
                    start_time: pcb.start_time,
                    time_used: pcb.time_used,
                };
                if self.running == Some(pcb.process_id) {
                    row.program_counter = self.cpu.program_counter;
                    row.value = self.cpu.value;
                    row.time_used = pcb.time_used + self.cpu.time_slice_used;
                }
                row
            })
            .collect();

        Snapshot {
            timestamp: self.timestamp,
            running: self.running,
            blocked: self.blocked.iter().collect(),
            ready: self.ready.iter().collect(),
            processes,
        }
    }

    /// Fetch the next instruction of the running process, advancing the CPU
    /// program counter. Falling off the end of the program synthesizes an
    /// implicit `E`.
    fn fetch(&mut self, pid: Pid) -> Instruction {
        let program = &self.table[pid].program;
        if self.cpu.program_counter < program.len() {
            let instruction = program[self.cpu.program_counter].clone();
            self.cpu.program_counter += 1;
            instruction
        } else {
            warn!(pid = pid.0, "end of program reached without an E instruction");
            Instruction::End
        }
    }

    fn exec_block(&mut self, pid: Pid) {
        let pcb = &mut self.table[pid];
        pcb.priority = pcb.priority.boosted();
        pcb.program_counter = self.cpu.program_counter;
        pcb.value = self.cpu.value;
        pcb.time_used += self.cpu.time_slice_used;
        pcb.state = ProcState::Blocked;
        let priority = pcb.priority;
        self.blocked.push(pid, priority);
        self.running = None;
        info!(pid = pid.0, priority = priority.level(), "BLOCKED");
    }

    fn exec_end(&mut self, pid: Pid) {
        let turnaround = self.timestamp + 1 - self.table[pid].start_time;
        self.stats.record(turnaround);

        let pcb = &mut self.table[pid];
        pcb.program_counter = self.cpu.program_counter;
        pcb.value = self.cpu.value;
        pcb.time_used += self.cpu.time_slice_used;
        pcb.state = ProcState::Terminated;
        self.running = None;
        info!(pid = pid.0, value = self.cpu.value, turnaround, "TERMINATED");
    }

    fn exec_fork(&mut self, parent: Pid, skip: i64) {
        let program_len = self.table[parent].program.len();
        let in_bounds = skip >= 0
            && self
                .cpu
                .program_counter
                .checked_add(skip as usize)
                .is_some_and(|target| target < program_len);
        if !in_bounds {
            warn!(pid = parent.0, skip, "fork target out of bounds, terminating parent");
            self.exec_end(parent);
            return;
        }

        // The child resumes at the instruction after the fork; the parent
        // skips the next `skip` child-only instructions.
        let parent_pcb = &self.table[parent];
        let child = PcbEntry {
            process_id: self.table.next_pid(),
            parent: Some(parent),
            program: parent_pcb.program.clone(),
            program_counter: self.cpu.program_counter,
            value: self.cpu.value,
            priority: parent_pcb.priority,
            state: ProcState::Ready,
            start_time: self.timestamp + 1,
            time_used: 0,
        };
        let priority = child.priority;
        let pid = self.table.push(child);
        self.ready.push(pid, priority);
        self.cpu.program_counter += skip as usize;
        info!(pid = pid.0, parent = parent.0, "FORKED");
    }

    fn exec_replace(&mut self, pid: Pid, filename: &str) {
        match program::load_program(Path::new(filename)) {
            Ok(new_program) => {
                self.table[pid].program = new_program;
                self.cpu.program_counter = 0;
                info!(pid = pid.0, file = filename, "REPLACED");
            }
            Err(e) => {
                warn!(
                    pid = pid.0,
                    file = filename,
                    error = %e,
                    "replace failed, terminating process"
                );
                self.exec_end(pid);
            }
        }
    }

    /// Pick the next process to run, if a switch is due.
    ///
    /// Runs after every quantum and every unblock. The running process is
    /// switched out only when its slice is exhausted or a more favored
    /// process is ready.
    fn schedule(&mut self) {
        let Some(candidate) = self.ready.peek() else {
            return;
        };

        match self.running {
            None => self.dispatch(None),
            Some(pid) => {
                let running_priority = self.table[pid].priority;
                if self.cpu.slice_exhausted() || candidate.priority < running_priority {
                    self.dispatch(Some(pid));
                }
            }
        }
    }

    /// Context switch: save the outgoing process (aging it one step), load
    /// the incoming one, and bind the CPU.
    fn dispatch(&mut self, outgoing: Option<Pid>) {
        // Take the chosen head before re-enqueueing the outgoing process, so
        // an outgoing process aged past the candidate cannot steal the slot.
        let Some(incoming) = self.ready.pop() else {
            return;
        };

        if let Some(prev) = outgoing {
            let pcb = &mut self.table[prev];
            pcb.program_counter = self.cpu.program_counter;
            pcb.value = self.cpu.value;
            pcb.time_used += self.cpu.time_slice_used;
            pcb.priority = pcb.priority.aged();
            pcb.state = ProcState::Ready;
            let priority = pcb.priority;
            self.ready.push(prev, priority);
            info!(pid = prev.0, priority = priority.level(), "PREEMPTED");
        }

        let pcb = &mut self.table[incoming.pid];
        pcb.state = ProcState::Running;
        let (pc, value, priority) = (pcb.program_counter, pcb.value, pcb.priority);
        self.cpu.bind(pc, value, priority);
        self.running = Some(incoming.pid);
        info!(
            pid = incoming.pid.0,
            priority = priority.level(),
            slice = self.cpu.time_slice,
            "DISPATCHED"
        );
    }

    /// Verify cross-structure bookkeeping; panics on violation.
    ///
    /// Checks that the CPU binding, PCB states, and queue membership agree:
    /// at most one running process, absent from both queues; every ready or
    /// blocked process sits in its queue exactly once; terminated processes
    /// sit in neither; program counters stay within their programs. Runs
    /// after every mutation in debug builds.
    pub fn check_consistency(&self) {
        let mut running_count = 0;
        for pcb in self.table.iter() {
            let pid = pcb.process_id;
            let in_ready = self.ready.contains(pid);
            let in_blocked = self.blocked.contains(pid);
            match pcb.state {
                ProcState::Running => {
                    running_count += 1;
                    assert_eq!(self.running, Some(pid), "running PCB not bound to the CPU");
                    assert!(!in_ready && !in_blocked, "running process {pid} sits in a queue");
                    // While running, the CPU program counter is authoritative.
                    assert!(
                        self.cpu.program_counter <= pcb.program.len(),
                        "CPU program counter out of bounds for process {pid}"
                    );
                }
                ProcState::Ready => {
                    assert!(in_ready, "ready process {pid} missing from ready queue");
                    assert!(!in_blocked, "ready process {pid} sits in blocked queue");
                }
                ProcState::Blocked => {
                    assert!(in_blocked, "blocked process {pid} missing from blocked queue");
                    assert!(!in_ready, "blocked process {pid} sits in ready queue");
                }
                ProcState::Terminated => {
                    assert!(!in_ready && !in_blocked, "terminated process {pid} sits in a queue");
                }
            }
            if pcb.state != ProcState::Running {
                assert!(
                    pcb.program_counter <= pcb.program.len(),
                    "saved program counter out of bounds for process {pid}"
                );
            }
        }
        assert!(running_count <= 1, "more than one running process");
        if let Some(pid) = self.running {
            assert_eq!(self.table[pid].state, ProcState::Running);
        }

        let ready_count = self
            .table
            .iter()
            .filter(|p| p.state == ProcState::Ready)
            .count();
        let blocked_count = self
            .table
            .iter()
            .filter(|p| p.state == ProcState::Blocked)
            .count();
        assert_eq!(self.ready.len(), ready_count, "ready queue size mismatch");
        assert_eq!(self.blocked.len(), blocked_count, "blocked queue size mismatch");
    }
}
