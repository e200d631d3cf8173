//! The simulated instruction set.
//!
//! Each simulated process runs a scripted program: an ordered sequence of
//! instructions, one executed per quantum. Arithmetic instructions mutate the
//! CPU accumulator; the remaining instructions drive scheduler-state
//! transitions (block, terminate, fork, program replacement).

use std::fmt;

/// One instruction of a simulated program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `S v` — set the accumulator to `v`.
    Set(i64),
    /// `A v` — add `v` to the accumulator.
    Add(i64),
    /// `D v` — subtract `v` from the accumulator.
    Decrement(i64),
    /// `F v` — fork a child resuming at the next instruction; the parent
    /// skips the following `v` instructions.
    Fork(i64),
    /// `B` — block the running process.
    Block,
    /// `E` — terminate the running process.
    End,
    /// `R file` — replace the running process's program with the contents of
    /// `file` and restart it from instruction 0.
    Replace(String),
}

impl Instruction {
    /// The single-letter opcode this instruction is written as.
    pub fn opcode(&self) -> char {
        match self {
            Instruction::Set(_) => 'S',
            Instruction::Add(_) => 'A',
            Instruction::Decrement(_) => 'D',
            Instruction::Fork(_) => 'F',
            Instruction::Block => 'B',
            Instruction::End => 'E',
            Instruction::Replace(_) => 'R',
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Set(v) | Instruction::Add(v) | Instruction::Decrement(v) => {
                write!(f, "{} {v}", self.opcode())
            }
            Instruction::Fork(v) => write!(f, "F {v}"),
            Instruction::Block => write!(f, "B"),
            Instruction::End => write!(f, "E"),
            Instruction::Replace(file) => write!(f, "R {file}"),
        }
    }
}
