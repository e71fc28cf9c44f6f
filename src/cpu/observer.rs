//! Step events.
//!
//! After every executed instruction the [`Cpu`](crate::cpu::Cpu) hands a
//! [`StepEvent`] to an [`Observer`]. The observer decides whether the run
//! continues, continues after a pause, or stops early. The console trace and
//! the terminal visualizer are both observers; the engine does not know how
//! an event is rendered.
//!
//! A blanket implementation of [`Observer`] for all `FnMut(&StepEvent) -> Control`
//! is provided.

use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::cpu::memory::MEMORY_SIZE;
use crate::cpu::word::{Opcode, Word};

/// State transition produced by one fetch-decode-execute cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEvent {
    /// Zero-based index of this step within the run.
    pub step: usize,
    /// Address the instruction was fetched from.
    pub address: u8,
    /// The raw instruction word.
    pub word: Word,
    /// Decoded operation.
    pub opcode: Opcode,
    /// Operand, for instructions that use one.
    pub operand: Option<u8>,
    /// Accumulator after the step.
    pub acc: u8,
    /// Program counter after the step.
    pub pc: u8,
    /// Every memory cell after the step.
    pub memory: [u8; MEMORY_SIZE],
}

impl StepEvent {
    /// Condition code after the step.
    pub fn condition(&self) -> bool {
        self.acc == 0
    }

    /// Trace label such as `"Add 5"` or `"Clear"`.
    pub fn label(&self) -> String {
        match self.operand {
            Some(operand) => format!("{} {}", self.opcode.name(), operand),
            None => self.opcode.name().to_string(),
        }
    }
}

/// What the engine should do after an observer has seen a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Fetch the next instruction immediately.
    Continue,
    /// Wait for the given time, then fetch the next instruction.
    ContinueAfter(Duration),
    /// Stop the run now.
    Abort,
}

/// Trait for consuming step events.
pub trait Observer {
    /// Called synchronously after each step. May block.
    fn on_step(&mut self, event: &StepEvent) -> Control;
}

impl<F> Observer for F where F: FnMut(&StepEvent) -> Control {
    fn on_step(&mut self, event: &StepEvent) -> Control {
        self(event)
    }
}

/// Observer that never interrupts a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_step(&mut self, _event: &StepEvent) -> Control {
        Control::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(opcode: Opcode, operand: Option<u8>) -> StepEvent {
        StepEvent {
            step: 0,
            address: 0,
            word: Word::encode(opcode, operand.unwrap_or(0)),
            opcode,
            operand,
            acc: 0,
            pc: 1,
            memory: [0; MEMORY_SIZE],
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(event(Opcode::Clear, None).label(), "Clear");
        assert_eq!(event(Opcode::Inc, None).label(), "Inc");
        assert_eq!(event(Opcode::Add, Some(5)).label(), "Add 5");
        assert_eq!(event(Opcode::Jmp, Some(4)).label(), "Jump 4");
        assert_eq!(event(Opcode::BranchIfNonZero, Some(12)).label(), "Branch 12");
        assert_eq!(event(Opcode::Store, Some(9)).label(), "Store 9");
    }

    #[test]
    fn test_closure_observer() {
        let mut seen = 0;
        let mut observer = |_: &StepEvent| {
            seen += 1;
            Control::Abort
        };
        assert_eq!(observer.on_step(&event(Opcode::Clear, None)), Control::Abort);
        assert_eq!(seen, 1);
    }

    #[test]
    fn test_condition() {
        let mut e = event(Opcode::Inc, None);
        assert!(e.condition());
        e.acc = 3;
        assert!(!e.condition());
    }
}
