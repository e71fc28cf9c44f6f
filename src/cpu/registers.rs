//! PATP CPU registers.
//!
//! The PATP has two pieces of register state:
//! - ACC: 8-bit data register (accumulator)
//! - PC: 5-bit program counter
//!
//! The condition code register is not stored. It always reads as
//! "ACC is zero", so it can never disagree with the accumulator.

use crate::cpu::memory::MAX_ADDRESS;
use serde::{Serialize, Deserialize};

/// The PATP register file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registers {
    /// ACC: 8-bit accumulator, wraps on overflow and underflow.
    pub acc: u8,

    /// PC: address of the next instruction to fetch (0-31).
    pub pc: u8,
}

impl Registers {
    /// Create a new register file with all values zeroed.
    pub const fn new() -> Self {
        Self { acc: 0, pc: 0 }
    }

    /// Reset all registers to zero.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// The condition code: set when the accumulator is zero.
    #[inline]
    pub const fn condition(&self) -> bool {
        self.acc == 0
    }

    /// Increment the program counter by 1, wrapping from 31 to 0.
    ///
    /// Returns `true` if the counter wrapped.
    pub fn advance_pc(&mut self) -> bool {
        if self.pc >= MAX_ADDRESS {
            self.pc = 0;
            true
        } else {
            self.pc += 1;
            false
        }
    }

    /// Set the program counter to an absolute address.
    #[inline]
    pub fn jump(&mut self, addr: u8) {
        self.pc = addr & MAX_ADDRESS;
    }
}
