//! Loader and disassembler for PATP programs.
//!
//! This module provides:
//! - The mnemonic resolver shared by the loader and the trace
//! - A single-pass loader (source text → memory image)
//! - A disassembler (memory image → source text)

pub mod mnemonic;
pub mod loader;
pub mod disasm;

pub use loader::{assemble, assemble_memory, load_file, LoadError, ParseMode};
pub use disasm::{disassemble, disassemble_word, to_source};
