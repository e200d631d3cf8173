//! procsim - Deterministic simulator of a preemptive multi-level-priority
//! process scheduler.
//!
//! The simulator models a classical kernel scheduler driven entirely by
//! operator commands: each `Q` advances a virtual clock by one quantum and
//! executes one instruction of the running simulated process. The instruction
//! set itself mutates scheduler state (programs fork children, block, replace
//! their own code, and terminate), which exercises the dispatcher and the
//! priority-aging policy.
//!
//! # Architecture
//!
//! - **Manager**: the single aggregate owning the PCB table, queues, CPU
//!   registers, clock, and statistics; all mutation goes through it
//! - **Programs**: line-oriented text parsed into a typed instruction set
//! - **Queues**: min-priority ready/blocked queues keyed `(priority, pid)`
//! - **Commands**: one byte per operator action (`Q`, `U`, `P`, `T`) read
//!   from a pipe; EOF shuts the manager down
//!
//! # Usage
//!
//! ```rust,no_run
//! use procsim::{run_commands, ProcessManager};
//!
//! let mut manager = ProcessManager::from_file("init.txt".as_ref())?;
//! let reason = run_commands(&mut manager, "QQPQT".as_bytes(), std::io::stdout())?;
//! println!("{reason:?}");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod command;
pub mod cpu;
pub mod instruction;
pub mod manager;
pub mod pcb;
pub mod program;
pub mod queue;
pub mod snapshot;
pub mod stats;
pub mod types;

// Re-export the main public types for convenience.
pub use command::{run_commands, Command, ExitReason};
pub use instruction::Instruction;
pub use manager::ProcessManager;
pub use pcb::{PcbEntry, PcbTable, ProcState};
pub use program::{load_program, parse_program, LoadError};
pub use snapshot::{ProcessRow, Snapshot};
pub use stats::TurnaroundStats;
pub use types::{Pid, Priority, Timestamp};
