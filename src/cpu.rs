//! The live execution context of the running process.

use crate::types::Priority;

/// CPU register block.
///
/// Holds the running process's program counter, accumulator, and time-slice
/// accounting. The program itself stays owned by the PCB; the manager
/// resolves it through the table while a process runs. Meaningful only while
/// a process is bound; the dispatcher overwrites every field on each switch.
#[derive(Debug, Default)]
pub struct Cpu {
    pub program_counter: usize,
    pub value: i64,
    /// Slice budget (quanta) granted at dispatch, from the process priority.
    pub time_slice: u32,
    /// Quanta consumed since dispatch.
    pub time_slice_used: u32,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu::default()
    }

    /// Bind the CPU to a process's saved context.
    pub fn bind(&mut self, program_counter: usize, value: i64, priority: Priority) {
        self.program_counter = program_counter;
        self.value = value;
        self.time_slice = priority.time_slice();
        self.time_slice_used = 0;
    }

    /// Whether the granted slice has been fully consumed.
    pub fn slice_exhausted(&self) -> bool {
        self.time_slice_used >= self.time_slice
    }
}
