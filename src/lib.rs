//! # PATP Emulator
//!
//! An interpreter and step visualizer for the PATP teaching computer.
//!
//! The PATP is a minimal accumulator machine: 32 eight-bit words of memory,
//! one data register, a zero condition derived from it, and eight opcodes
//! packed into the top three bits of each word. A run is a fixed budget of
//! 32 fetch-decode-execute steps, each reported to an [`Observer`].

pub mod cpu;
pub mod asm;
pub mod trace;

#[cfg(feature = "tui")]
pub mod tui;

// Re-export commonly used types
pub use cpu::{
    Control, Cpu, Memory, NullObserver, Observer, Opcode, Registers, RunOutcome, RunReport,
    StepEvent, Termination, Word, MEMORY_SIZE, STEP_BUDGET,
};
pub use asm::{assemble, disassemble, load_file, LoadError, ParseMode};

#[cfg(feature = "tui")]
pub use tui::run_visual;
