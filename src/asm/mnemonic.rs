//! Mnemonic resolution.
//!
//! Mnemonics are case-sensitive and several operations accept synonyms.
//! Anything unrecognized, including an empty token, means CLEAR.

use crate::cpu::Opcode;

/// Longest mnemonic the loader reads as one token.
pub const MAX_MNEMONIC_LEN: usize = 5;

/// Resolve a mnemonic to its opcode.
///
/// Unknown mnemonics resolve to [`Opcode::Clear`].
pub fn resolve(mnemonic: &str) -> Opcode {
    lookup(mnemonic).unwrap_or(Opcode::Clear)
}

/// Resolve a mnemonic, returning `None` when it is not a known spelling.
///
/// `"CLEAR"` and `"CLR"` are recognized here so callers can tell an explicit
/// CLEAR apart from a fallback.
pub fn lookup(mnemonic: &str) -> Option<Opcode> {
    let opcode = match mnemonic {
        "CLEAR" | "CLR" => Opcode::Clear,
        "INC1" | "INC" => Opcode::Inc,
        "ADD" => Opcode::Add,
        "DEC1" | "DEC" => Opcode::Dec,
        "JMP" => Opcode::Jmp,
        "BUZ" | "BNZ" | "BZC" | "BNE" => Opcode::BranchIfNonZero,
        "LOAD" => Opcode::Load,
        "STORE" => Opcode::Store,
        _ => return None,
    };
    Some(opcode)
}

/// Whether assembling `opcode` consumes a trailing operand token.
pub fn operand_required(opcode: Opcode) -> bool {
    opcode.operand_required()
}

/// Canonical source spelling of an opcode.
pub fn mnemonic(opcode: Opcode) -> &'static str {
    match opcode {
        Opcode::Clear => "CLEAR",
        Opcode::Inc => "INC",
        Opcode::Add => "ADD",
        Opcode::Dec => "DEC",
        Opcode::Jmp => "JMP",
        Opcode::BranchIfNonZero => "BNZ",
        Opcode::Load => "LOAD",
        Opcode::Store => "STORE",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonyms() {
        assert_eq!(resolve("INC1"), Opcode::Inc);
        assert_eq!(resolve("INC"), Opcode::Inc);
        assert_eq!(resolve("ADD"), Opcode::Add);
        assert_eq!(resolve("DEC1"), Opcode::Dec);
        assert_eq!(resolve("DEC"), Opcode::Dec);
        assert_eq!(resolve("JMP"), Opcode::Jmp);
        for branch in ["BUZ", "BNZ", "BZC", "BNE"] {
            assert_eq!(resolve(branch), Opcode::BranchIfNonZero);
        }
        assert_eq!(resolve("LOAD"), Opcode::Load);
        assert_eq!(resolve("STORE"), Opcode::Store);
    }

    #[test]
    fn test_unknown_defaults_to_clear() {
        assert_eq!(resolve(""), Opcode::Clear);
        assert_eq!(resolve("HALT"), Opcode::Clear);
        assert_eq!(resolve("CLEAR"), Opcode::Clear);
        assert_eq!(lookup("HALT"), None);
    }

    #[test]
    fn test_case_sensitive() {
        assert_eq!(resolve("add"), Opcode::Clear);
        assert_eq!(resolve("Store"), Opcode::Clear);
    }

    #[test]
    fn test_canonical_spelling_resolves_back() {
        for op in Opcode::ALL {
            assert_eq!(resolve(mnemonic(op)), op);
            assert!(mnemonic(op).len() <= MAX_MNEMONIC_LEN);
        }
    }

    #[test]
    fn test_operand_required() {
        let with_operand: Vec<Opcode> = Opcode::ALL
            .into_iter()
            .filter(|&op| operand_required(op))
            .collect();
        assert_eq!(
            with_operand,
            vec![Opcode::Add, Opcode::Jmp, Opcode::BranchIfNonZero, Opcode::Load, Opcode::Store]
        );
    }
}
