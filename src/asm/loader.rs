//! Program loader for PATP source text.
//!
//! Syntax is a flat stream of whitespace-separated tokens:
//! ```text
//! ADD 3       mnemonic followed by a decimal operand
//! STORE 10
//! INC         CLEAR, INC and DEC take no operand
//! BNZ 1
//! ```
//!
//! There are no labels, comments or line structure. At most 32 instructions
//! are read; any further tokens are ignored and unused cells stay CLEAR.
//! Files are read as bytes, so trailing text in any encoding is harmless.

use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::asm::mnemonic::{self, MAX_MNEMONIC_LEN};
use crate::cpu::{Memory, Word, MEMORY_SIZE};
use crate::cpu::word::OPERAND_MASK;

/// How malformed operands are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Accept anything. Long mnemonics are split every 5 characters, operands
    /// are read from their leading digits, non-numeric or missing operands
    /// read as 0 and operands keep only their low 5 bits.
    #[default]
    Permissive,
    /// Reject long mnemonics and missing, non-numeric or out-of-range operands.
    Strict,
}

/// Assemble source text into at most 32 instruction words.
pub fn assemble(source: &str, mode: ParseMode) -> Result<Vec<Word>, LoadError> {
    let mut loader = Loader::new(source, mode);
    loader.assemble()
}

/// Assemble source text into a full memory image.
pub fn assemble_memory(source: &str, mode: ParseMode) -> Result<Memory, LoadError> {
    let mut mem = Memory::new();
    for (addr, word) in (0..).zip(assemble(source, mode)?) {
        mem.write(addr, word);
    }
    Ok(mem)
}

/// Read and assemble a program file.
pub fn load_file<P: AsRef<Path>>(path: P, mode: ParseMode) -> Result<Memory, LoadError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let mem = assemble_memory(&String::from_utf8_lossy(&bytes), mode)?;
    info!("loaded {}", path.display());
    Ok(mem)
}

/// Token stream with one token of lookahead.
struct Tokens<'a> {
    iter: std::str::SplitAsciiWhitespace<'a>,
    pending: Option<&'a str>,
}

impl<'a> Tokens<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            iter: source.split_ascii_whitespace(),
            pending: None,
        }
    }

    fn peek(&mut self) -> Option<&'a str> {
        if self.pending.is_none() {
            self.pending = self.iter.next();
        }
        self.pending
    }

    fn next(&mut self) -> Option<&'a str> {
        self.peek();
        self.pending.take()
    }

    /// Return the unread tail of a token to the front of the stream.
    fn put_back(&mut self, rest: &'a str) {
        self.pending = Some(rest);
    }

    /// Take at most `max_chars` characters of the next token, leaving the
    /// rest of it to be read next.
    fn next_prefix(&mut self, max_chars: usize) -> Option<&'a str> {
        let token = self.next()?;
        match token.char_indices().nth(max_chars) {
            Some((split, _)) => {
                self.pending = Some(&token[split..]);
                Some(&token[..split])
            }
            None => Some(token),
        }
    }
}

/// The loader state.
struct Loader<'a> {
    tokens: Tokens<'a>,
    mode: ParseMode,
    /// Output instructions.
    output: Vec<Word>,
}

impl<'a> Loader<'a> {
    fn new(source: &'a str, mode: ParseMode) -> Self {
        Self {
            tokens: Tokens::new(source),
            mode,
            output: Vec::with_capacity(MEMORY_SIZE),
        }
    }

    fn assemble(&mut self) -> Result<Vec<Word>, LoadError> {
        while self.output.len() < MEMORY_SIZE {
            let index = self.output.len();

            let Some(token) = self.next_mnemonic(index)? else {
                break;
            };

            let opcode = match mnemonic::lookup(token) {
                Some(opcode) => opcode,
                None => {
                    warn!("instruction {}: unknown mnemonic {:?}, assembled as CLEAR", index, token);
                    mnemonic::resolve(token)
                }
            };

            let operand = if mnemonic::operand_required(opcode) {
                self.operand(index, token)?
            } else {
                0
            };

            self.output.push(Word::encode(opcode, operand));
        }

        if self.tokens.peek().is_some() {
            warn!("program longer than {} instructions, trailing tokens ignored", MEMORY_SIZE);
        }

        Ok(std::mem::take(&mut self.output))
    }

    fn next_mnemonic(&mut self, index: usize) -> Result<Option<&'a str>, LoadError> {
        match self.mode {
            ParseMode::Permissive => Ok(self.tokens.next_prefix(MAX_MNEMONIC_LEN)),
            ParseMode::Strict => match self.tokens.next() {
                Some(token) if token.chars().count() > MAX_MNEMONIC_LEN => {
                    Err(LoadError::MnemonicTooLong { index, token: token.to_string() })
                }
                token => Ok(token),
            },
        }
    }

    fn operand(&mut self, index: usize, mnemonic: &str) -> Result<u8, LoadError> {
        let Some(token) = self.tokens.peek() else {
            return match self.mode {
                ParseMode::Permissive => {
                    warn!("instruction {}: {} is missing its operand, using 0", index, mnemonic);
                    Ok(0)
                }
                ParseMode::Strict => Err(LoadError::MissingOperand {
                    index,
                    mnemonic: mnemonic.to_string(),
                }),
            };
        };

        let value = match self.mode {
            ParseMode::Permissive => match leading_int(token) {
                Some((value, rest)) => {
                    self.tokens.next();
                    if !rest.is_empty() {
                        warn!("instruction {}: {:?} after operand {} read as the next mnemonic", index, rest, value);
                        self.tokens.put_back(rest);
                    }
                    value
                }
                // The token stays in the stream and is read as the next mnemonic.
                None => {
                    warn!("instruction {}: operand {:?} is not a number, using 0", index, token);
                    return Ok(0);
                }
            },
            ParseMode::Strict => match token.parse::<i32>() {
                Ok(value) => {
                    self.tokens.next();
                    value
                }
                Err(_) => {
                    return Err(LoadError::InvalidOperand {
                        index,
                        token: token.to_string(),
                    });
                }
            },
        };

        match u8::try_from(value) {
            Ok(operand) if operand <= OPERAND_MASK => Ok(operand),
            _ => match self.mode {
                ParseMode::Permissive => {
                    let operand = (value & OPERAND_MASK as i32) as u8;
                    warn!("instruction {}: operand {} truncated to {}", index, value, operand);
                    Ok(operand)
                }
                ParseMode::Strict => Err(LoadError::OperandOutOfRange { index, value }),
            },
        }
    }
}

/// Split a token into its leading decimal integer and the rest.
///
/// Values beyond the `i32` range saturate.
fn leading_int(token: &str) -> Option<(i32, &str)> {
    let sign_len = usize::from(token.starts_with(['+', '-']));
    let digits = token[sign_len..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }

    let (number, rest) = token.split_at(sign_len + digits);
    let magnitude = number[sign_len..]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    let value = if number.starts_with('-') { -magnitude } else { magnitude };

    Some((value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32, rest))
}

/// Errors that can occur while loading a program.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("instruction {index}: mnemonic {token:?} is longer than 5 characters")]
    MnemonicTooLong { index: usize, token: String },

    #[error("instruction {index}: {mnemonic} requires an operand")]
    MissingOperand { index: usize, mnemonic: String },

    #[error("instruction {index}: operand {token:?} is not a decimal integer")]
    InvalidOperand { index: usize, token: String },

    #[error("instruction {index}: operand {value} is outside 0-31")]
    OperandOutOfRange { index: usize, value: i32 },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::Opcode;

    fn words(source: &str) -> Vec<Word> {
        assemble(source, ParseMode::Permissive).unwrap()
    }

    #[test]
    fn test_assemble_simple() {
        let source = "ADD 3\nSTORE 10\n  INC DEC\tLOAD 10 BNZ 0";

        let result = words(source);

        assert_eq!(result, vec![
            Word::encode(Opcode::Add, 3),
            Word::encode(Opcode::Store, 10),
            Word::encode(Opcode::Inc, 0),
            Word::encode(Opcode::Dec, 0),
            Word::encode(Opcode::Load, 10),
            Word::encode(Opcode::BranchIfNonZero, 0),
        ]);
    }

    #[test]
    fn test_empty_source() {
        assert!(words("").is_empty());
        assert!(words(" \n\t ").is_empty());

        let mem = assemble_memory("", ParseMode::Permissive).unwrap();
        assert_eq!(mem, Memory::new());
    }

    #[test]
    fn test_unknown_mnemonic_is_clear() {
        let result = words("NOPE ADD 1");
        assert_eq!(result, vec![Word::ZERO, Word::encode(Opcode::Add, 1)]);
    }

    #[test]
    fn test_clear_takes_no_operand() {
        // The "5" is read as a mnemonic, which is unknown and so also CLEAR.
        let result = words("CLEAR 5 INC");
        assert_eq!(result, vec![Word::ZERO, Word::ZERO, Word::encode(Opcode::Inc, 0)]);
    }

    #[test]
    fn test_extra_instructions_ignored() {
        let source = "INC ".repeat(40);
        let result = words(&source);
        assert_eq!(result.len(), MEMORY_SIZE);
        assert!(result.iter().all(|w| w.opcode() == Opcode::Inc));
    }

    #[test]
    fn test_permissive_long_mnemonic_split() {
        // "STORE10" reads as "STORE" followed by "10".
        let result = words("STORE10");
        assert_eq!(result, vec![Word::encode(Opcode::Store, 10)]);
    }

    #[test]
    fn test_permissive_bad_operand_not_consumed() {
        let result = words("ADD INC");
        assert_eq!(result, vec![Word::encode(Opcode::Add, 0), Word::encode(Opcode::Inc, 0)]);
    }

    #[test]
    fn test_permissive_missing_operand_at_end() {
        let result = words("INC JMP");
        assert_eq!(result, vec![Word::encode(Opcode::Inc, 0), Word::encode(Opcode::Jmp, 0)]);
    }

    #[test]
    fn test_permissive_operand_truncated() {
        let result = words("ADD 33 ADD -1");
        assert_eq!(result, vec![Word::encode(Opcode::Add, 1), Word::encode(Opcode::Add, 31)]);
    }

    #[test]
    fn test_permissive_operand_leading_digits() {
        // "5abc" reads as operand 5 followed by the mnemonic "abc".
        let result = words("ADD 5abc INC");
        assert_eq!(result, vec![
            Word::encode(Opcode::Add, 5),
            Word::ZERO,
            Word::encode(Opcode::Inc, 0),
        ]);

        let result = words("JMP 3INC");
        assert_eq!(result, vec![Word::encode(Opcode::Jmp, 3), Word::encode(Opcode::Inc, 0)]);
    }

    #[test]
    fn test_permissive_operand_overflow_saturates() {
        // i32::MAX keeps its low five bits, all set.
        let result = words("ADD 99999999999 LOAD -99999999999");
        assert_eq!(result, vec![Word::encode(Opcode::Add, 31), Word::encode(Opcode::Load, 0)]);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("12"), Some((12, "")));
        assert_eq!(leading_int("+7x"), Some((7, "x")));
        assert_eq!(leading_int("-3-4"), Some((-3, "-4")));
        assert_eq!(leading_int("-"), None);
        assert_eq!(leading_int("abc"), None);
    }

    #[test]
    fn test_strict_rejects_trailing_operand_text() {
        assert!(matches!(
            assemble("ADD 5abc", ParseMode::Strict),
            Err(LoadError::InvalidOperand { index: 0, .. })
        ));
    }

    #[test]
    fn test_strict_accepts_valid_program() {
        let result = assemble("ADD 31 STORE 0 FOO", ParseMode::Strict).unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[2], Word::ZERO);
    }

    #[test]
    fn test_strict_errors() {
        assert!(matches!(
            assemble("STORE10", ParseMode::Strict),
            Err(LoadError::MnemonicTooLong { index: 0, .. })
        ));
        assert!(matches!(
            assemble("INC ADD", ParseMode::Strict),
            Err(LoadError::MissingOperand { index: 1, .. })
        ));
        assert!(matches!(
            assemble("LOAD x", ParseMode::Strict),
            Err(LoadError::InvalidOperand { index: 0, .. })
        ));
        assert!(matches!(
            assemble("JMP 32", ParseMode::Strict),
            Err(LoadError::OperandOutOfRange { index: 0, value: 32 })
        ));
        assert!(matches!(
            assemble("JMP -1", ParseMode::Strict),
            Err(LoadError::OperandOutOfRange { index: 0, value: -1 })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_file("/nonexistent/patp/program.txt", ParseMode::Permissive).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("patp-loader-{}.txt", std::process::id()));
        std::fs::write(&path, "ADD 3\nSTORE 10\n").unwrap();

        let mem = load_file(&path, ParseMode::Strict).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mem.read(0), Word::encode(Opcode::Add, 3));
        assert_eq!(mem.read(1), Word::encode(Opcode::Store, 10));
        assert!(mem.read(2).is_zero());
    }

    #[test]
    fn test_load_file_with_non_utf8_bytes() {
        let path = std::env::temp_dir().join(format!("patp-loader-latin1-{}.txt", std::process::id()));
        std::fs::write(&path, b"ADD 3 STORE 10 caf\xe9\n").unwrap();

        let mem = load_file(&path, ParseMode::Permissive).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(mem.read(0), Word::encode(Opcode::Add, 3));
        assert_eq!(mem.read(1), Word::encode(Opcode::Store, 10));
        // The trailing word is an unknown mnemonic.
        assert!(mem.read(2).is_zero());
        assert!(mem.read(3).is_zero());
    }
}
