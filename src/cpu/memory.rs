//! PATP main store.
//!
//! The main store is fixed at 32 eight-bit words, addressed 0-31 by the
//! 5-bit operand field, so every operand is a valid address.

use crate::cpu::word::Word;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// The number of words in the main store.
pub const MEMORY_SIZE: usize = 32;

/// Highest valid address.
pub const MAX_ADDRESS: u8 = (MEMORY_SIZE - 1) as u8;

/// PATP memory: 32 eight-bit cells.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memory {
    cells: [Word; MEMORY_SIZE],
}

impl Memory {
    /// Create a new memory with all cells zeroed (all CLEAR).
    pub const fn new() -> Self {
        Self {
            cells: [Word::ZERO; MEMORY_SIZE],
        }
    }

    /// Build memory from a raw byte image.
    pub fn from_bytes(bytes: [u8; MEMORY_SIZE]) -> Self {
        Self {
            cells: bytes.map(Word::new),
        }
    }

    /// Read a cell by address (0-31).
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn read(&self, addr: u8) -> Word {
        assert!(addr <= MAX_ADDRESS, "Memory address {} out of range (0-{})", addr, MAX_ADDRESS);
        self.cells[addr as usize]
    }

    /// Write a cell by address (0-31).
    ///
    /// # Panics
    /// Panics if address is out of range.
    #[inline]
    pub fn write(&mut self, addr: u8, value: Word) {
        assert!(addr <= MAX_ADDRESS, "Memory address {} out of range (0-{})", addr, MAX_ADDRESS);
        self.cells[addr as usize] = value;
    }

    /// Clear all memory to zeros.
    pub fn clear(&mut self) {
        self.cells = [Word::ZERO; MEMORY_SIZE];
    }

    /// Load a program into memory starting at address 0.
    ///
    /// Cells past the end of the program are zeroed.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        if program.len() > MEMORY_SIZE {
            return Err(MemoryError::ProgramTooLarge {
                size: program.len(),
                available: MEMORY_SIZE,
            });
        }

        self.clear();
        self.cells[..program.len()].copy_from_slice(program);

        Ok(())
    }

    /// All cells in address order.
    pub fn words(&self) -> &[Word; MEMORY_SIZE] {
        &self.cells
    }

    /// Raw byte image of every cell.
    pub fn to_bytes(&self) -> [u8; MEMORY_SIZE] {
        self.cells.map(Word::raw)
    }

    /// Dump memory contents as `(address, word)` pairs.
    pub fn dump(&self) -> impl Iterator<Item = (u8, Word)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .map(|(addr, &word)| (addr as u8, word))
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Memory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let non_zero = self.cells.iter().filter(|cell| !cell.is_zero()).count();

        f.debug_struct("Memory")
            .field("non_zero_cells", &non_zero)
            .field("total_cells", &MEMORY_SIZE)
            .finish()
    }
}

/// Errors that can occur during memory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    /// Program is too large to fit in memory.
    #[error("program size {size} exceeds available space {available}")]
    ProgramTooLarge { size: usize, available: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::word::Opcode;

    #[test]
    fn test_memory_read_write() {
        let mut mem = Memory::new();
        mem.write(10, Word::new(42));
        assert_eq!(mem.read(10).raw(), 42);
        assert_eq!(mem.read(11).raw(), 0);
    }

    #[test]
    #[should_panic]
    fn test_memory_bounds() {
        let mem = Memory::new();
        mem.read(32);
    }

    #[test]
    fn test_load_program_zero_fills() {
        let mut mem = Memory::from_bytes([0xff; MEMORY_SIZE]);
        let program = [
            Word::encode(Opcode::Add, 3),
            Word::encode(Opcode::Store, 10),
        ];

        mem.load_program(&program).unwrap();

        assert_eq!(mem.read(0), program[0]);
        assert_eq!(mem.read(1), program[1]);
        assert!(mem.dump().skip(2).all(|(_, w)| w.is_zero()));
    }

    #[test]
    fn test_load_program_too_large() {
        let mut mem = Memory::new();
        let program = vec![Word::ZERO; MEMORY_SIZE + 1];
        assert_eq!(
            mem.load_program(&program),
            Err(MemoryError::ProgramTooLarge { size: 33, available: 32 })
        );
    }

    #[test]
    fn test_byte_image() {
        let mut bytes = [0u8; MEMORY_SIZE];
        bytes[31] = 7;
        let mem = Memory::from_bytes(bytes);
        assert_eq!(mem.read(31).raw(), 7);
        assert_eq!(mem.to_bytes(), bytes);
    }
}
