//! PATP words and the instruction decoder.
//!
//! Every memory cell holds one 8-bit word. When fetched as an instruction the
//! word is split into two fields:
//!
//! ```text
//!  7   6   5   4   3   2   1   0
//! +-----------+-------------------+
//! |  opcode   |      operand      |
//! +-----------+-------------------+
//! ```
//!
//! All 256 bit patterns decode to some instruction; there is no illegal opcode.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Number of bits in a word.
pub const WORD_BITS: u32 = 8;

/// Mask selecting the operand field.
pub const OPERAND_MASK: u8 = 0x1f;

/// Mask selecting the opcode field.
pub const OPCODE_MASK: u8 = 0xe0;

/// Position of the opcode field.
pub const OPCODE_SHIFT: u32 = 5;

/// The seven PATP operations.
///
/// CLEAR is opcode 0 so that zeroed memory is a run of CLEAR instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Opcode {
    /// ACC := 0
    Clear = 0,
    /// ACC := ACC + 1
    Inc = 1,
    /// ACC := ACC + operand
    Add = 2,
    /// ACC := ACC - 1
    Dec = 3,
    /// PC := operand
    Jmp = 4,
    /// if ACC != 0 then PC := operand
    BranchIfNonZero = 5,
    /// ACC := MEM[operand]
    Load = 6,
    /// MEM[operand] := ACC
    Store = 7,
}

impl Opcode {
    /// All opcodes in encoding order.
    pub const ALL: [Opcode; 8] = [
        Opcode::Clear,
        Opcode::Inc,
        Opcode::Add,
        Opcode::Dec,
        Opcode::Jmp,
        Opcode::BranchIfNonZero,
        Opcode::Load,
        Opcode::Store,
    ];

    /// Build an opcode from the low three bits of `bits`.
    ///
    /// Total: higher bits are ignored.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            1 => Opcode::Inc,
            2 => Opcode::Add,
            3 => Opcode::Dec,
            4 => Opcode::Jmp,
            5 => Opcode::BranchIfNonZero,
            6 => Opcode::Load,
            7 => Opcode::Store,
            _ => Opcode::Clear,
        }
    }

    /// The 3-bit encoding of this opcode.
    #[inline]
    pub const fn bits(self) -> u8 {
        self as u8
    }

    /// Whether the instruction reads its operand field.
    ///
    /// CLEAR, INC and DEC ignore it, and the assembler does not expect one.
    #[inline]
    pub const fn operand_required(self) -> bool {
        !matches!(self, Opcode::Clear | Opcode::Inc | Opcode::Dec)
    }

    /// Human-readable action name used in traces.
    pub const fn name(self) -> &'static str {
        match self {
            Opcode::Clear => "Clear",
            Opcode::Inc => "Inc",
            Opcode::Add => "Add",
            Opcode::Dec => "Dec",
            Opcode::Jmp => "Jump",
            Opcode::BranchIfNonZero => "Branch",
            Opcode::Load => "Load",
            Opcode::Store => "Store",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An 8-bit memory word, holding either an instruction or data.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(u8);

impl Word {
    /// The all-zero word (a CLEAR instruction).
    pub const ZERO: Word = Word(0);

    /// Wrap a raw byte.
    #[inline]
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    /// The raw byte.
    #[inline]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Top three bits as an opcode.
    #[inline]
    pub const fn opcode(self) -> Opcode {
        Opcode::from_bits((self.0 & OPCODE_MASK) >> OPCODE_SHIFT)
    }

    /// Bottom five bits.
    #[inline]
    pub const fn operand(self) -> u8 {
        self.0 & OPERAND_MASK
    }

    /// Split the word into its instruction fields.
    #[inline]
    pub const fn decode(self) -> (Opcode, u8) {
        (self.opcode(), self.operand())
    }

    /// Pack an opcode and operand into a word.
    ///
    /// Operand bits above the 5-bit field are discarded.
    #[inline]
    pub const fn encode(opcode: Opcode, operand: u8) -> Self {
        Self((opcode.bits() << OPCODE_SHIFT) | (operand & OPERAND_MASK))
    }

    /// Whether the word is zero.
    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl From<u8> for Word {
    fn from(raw: u8) -> Self {
        Self(raw)
    }
}

impl From<Word> for u8 {
    fn from(word: Word) -> Self {
        word.0
    }
}

impl fmt::Display for Word {
    /// Eight binary digits, most significant first.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08b}", self.0)
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({:08b} = {:?} {})", self.0, self.opcode(), self.operand())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_decode_every_byte_roundtrips() {
        for raw in 0..=u8::MAX {
            let word = Word::new(raw);
            let (opcode, operand) = word.decode();
            assert!(operand <= 31);
            assert_eq!(Word::encode(opcode, operand), word);
            assert_eq!((opcode.bits() << 5) | operand, raw);
        }
    }

    #[test]
    fn test_opcode_bits() {
        for (i, op) in Opcode::ALL.iter().enumerate() {
            assert_eq!(op.bits() as usize, i);
            assert_eq!(Opcode::from_bits(i as u8), *op);
        }
    }

    #[test]
    fn test_operand_required() {
        assert!(!Opcode::Clear.operand_required());
        assert!(!Opcode::Inc.operand_required());
        assert!(!Opcode::Dec.operand_required());
        assert!(Opcode::Add.operand_required());
        assert!(Opcode::Jmp.operand_required());
        assert!(Opcode::BranchIfNonZero.operand_required());
        assert!(Opcode::Load.operand_required());
        assert!(Opcode::Store.operand_required());
    }

    #[test]
    fn test_encode_masks_operand() {
        let word = Word::encode(Opcode::Add, 0xff);
        assert_eq!(word.opcode(), Opcode::Add);
        assert_eq!(word.operand(), 31);
    }

    #[test]
    fn test_display_binary() {
        assert_eq!(Word::encode(Opcode::Store, 10).to_string(), "11101010");
        assert_eq!(Word::ZERO.to_string(), "00000000");
    }

    proptest! {
        #[test]
        fn prop_fields_are_independent(op in 0u8..8, operand in 0u8..32) {
            let word = Word::encode(Opcode::from_bits(op), operand);
            prop_assert_eq!(word.opcode().bits(), op);
            prop_assert_eq!(word.operand(), operand);
        }
    }
}
