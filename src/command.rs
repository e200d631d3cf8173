//! Operator command protocol.
//!
//! The manager consumes one ASCII byte per command from a unidirectional
//! pipe: `Q` advances a quantum, `U` unblocks, `P` dumps the system state,
//! `T` reports the average turnaround and terminates. Commands are
//! case-insensitive, whitespace bytes are skipped, and unknown bytes produce
//! a diagnostic without stopping the run. End-of-stream means the commander
//! went away: the manager shuts down silently, without the turnaround line.

use std::io::{self, ErrorKind, Read, Write};

use tracing::{debug, warn};

use crate::manager::ProcessManager;

/// A decoded operator command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `Q` — advance the system by one quantum.
    Quantum,
    /// `U` — move the most favored blocked process to the ready queue.
    Unblock,
    /// `P` — dump a snapshot of the system state.
    Print,
    /// `T` — report the average turnaround time and shut down.
    Terminate,
}

impl Command {
    /// Decode a command byte, case-insensitively. `None` for unknown bytes.
    pub fn from_byte(byte: u8) -> Option<Command> {
        match byte.to_ascii_uppercase() {
            b'Q' => Some(Command::Quantum),
            b'U' => Some(Command::Unblock),
            b'P' => Some(Command::Print),
            b'T' => Some(Command::Terminate),
            _ => None,
        }
    }
}

/// Why the command loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A `T` command was received; the turnaround report was written.
    Terminated,
    /// The command stream hit end-of-file (commander exited or closed the
    /// pipe); no report is written.
    Disconnected,
}

/// Drive the manager from a byte stream of commands until `T` or EOF.
///
/// `P` snapshots and the final `T` report are written to `out`; given the
/// same bootstrap program and the same command bytes, the bytes written to
/// `out` are identical across runs.
pub fn run_commands<R: Read, W: Write>(
    manager: &mut ProcessManager,
    mut input: R,
    mut out: W,
) -> io::Result<ExitReason> {
    let mut byte = [0u8; 1];
    loop {
        let n = match input.read(&mut byte) {
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        if n == 0 {
            debug!("command stream closed, shutting down");
            return Ok(ExitReason::Disconnected);
        }

        let b = byte[0];
        if b.is_ascii_whitespace() {
            continue;
        }

        match Command::from_byte(b) {
            Some(Command::Quantum) => manager.quantum(),
            Some(Command::Unblock) => manager.unblock(),
            Some(Command::Print) => write!(out, "{}", manager.snapshot())?,
            Some(Command::Terminate) => {
                write_report(manager, &mut out)?;
                return Ok(ExitReason::Terminated);
            }
            None => warn!(byte = %(b as char), "unknown command"),
        }
    }
}

fn write_report<W: Write>(manager: &ProcessManager, out: &mut W) -> io::Result<()> {
    match manager.average_turnaround() {
        Some(average) => writeln!(out, "average turnaround time: {average:.2}"),
        None => writeln!(out, "no processes terminated"),
    }
}
