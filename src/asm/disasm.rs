//! Disassembler for PATP programs.
//!
//! Converts memory words back to source mnemonics.

use crate::asm::mnemonic;
use crate::cpu::{Memory, Word};

/// Disassemble a single word to source text, e.g. `"ADD 3"`.
pub fn disassemble_word(word: Word) -> String {
    let (opcode, operand) = word.decode();
    if opcode.operand_required() {
        format!("{} {}", mnemonic::mnemonic(opcode), operand)
    } else {
        mnemonic::mnemonic(opcode).to_string()
    }
}

/// Annotated listing of every memory cell.
pub fn disassemble(mem: &Memory) -> String {
    let mut output = String::new();

    for (addr, word) in mem.dump() {
        output.push_str(&format!("{:2}: {:<9} {}\n", addr, disassemble_word(word), word));
    }

    output
}

/// Source text that loads back to the same memory image.
///
/// Trailing CLEAR words are left out since unused cells load as CLEAR.
pub fn to_source(mem: &Memory) -> String {
    let words = mem.words();
    let used = words.iter().rposition(|w| !w.is_zero()).map_or(0, |last| last + 1);

    words[..used]
        .iter()
        .map(|&word| disassemble_word(word) + "\n")
        .collect()
}
