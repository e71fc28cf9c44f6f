//! CPU emulation for the PATP computer.
//!
//! This module implements the complete PATP architecture:
//! - 32 eight-bit memory words
//! - 2 registers: ACC (accumulator) and PC, with a derived zero condition
//! - 8 opcodes packed into the top 3 bits of a word, operand in the low 5

pub mod word;
pub mod memory;
pub mod registers;
pub mod observer;
pub mod execute;

pub use word::{Word, Opcode};
pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::Registers;
pub use observer::{StepEvent, Control, Observer, NullObserver};
pub use execute::{Cpu, RunOutcome, RunReport, Termination, STEP_BUDGET};
