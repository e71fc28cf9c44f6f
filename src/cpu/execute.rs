//! CPU execution engine for the PATP.
//!
//! Implements the fetch-decode-execute cycle and all instruction behaviors.
//! The engine is total: every word decodes to an instruction and every
//! operand is a valid address, so stepping never fails.

use std::thread;

use log::{debug, info};
use serde::{Serialize, Deserialize};

use crate::cpu::{Memory, Registers};
use crate::cpu::memory::MemoryError;
use crate::cpu::observer::{Control, NullObserver, Observer, StepEvent};
use crate::cpu::word::{Opcode, Word};

/// Steps executed by a default run.
pub const STEP_BUDGET: usize = 32;

/// When a run stops on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Termination {
    /// Execute exactly this many steps. The PC wraps from 31 to 0.
    Steps(usize),
    /// Stop when the PC advances past address 31, or after `max_steps`.
    EndOfStore { max_steps: usize },
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Steps(STEP_BUDGET)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// The step budget was used up.
    Completed,
    /// The PC advanced past the last address.
    EndOfStore,
    /// The observer asked to stop.
    Aborted,
}

/// Result of [`Cpu::run`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Why the run ended.
    pub outcome: RunOutcome,
    /// Number of steps executed.
    pub steps: usize,
    /// Every step, in execution order.
    pub trace: Vec<StepEvent>,
}

/// The PATP CPU.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main store.
    pub mem: Memory,
    /// Steps executed since the last reset.
    pub steps: usize,
    /// Memory image restored by [`Cpu::reset`].
    program: Memory,
}

impl Cpu {
    /// Create a new CPU with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            steps: 0,
            program: Memory::new(),
        }
    }

    /// Create a CPU whose memory holds `mem`.
    pub fn with_memory(mem: Memory) -> Self {
        Self {
            regs: Registers::new(),
            mem: mem.clone(),
            steps: 0,
            program: mem,
        }
    }

    /// Reset registers and restore the loaded program image.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem = self.program.clone();
        self.steps = 0;
    }

    /// Load a program into memory and reset.
    pub fn load_program(&mut self, program: &[Word]) -> Result<(), MemoryError> {
        self.program.load_program(program)?;
        self.reset();
        Ok(())
    }

    /// The condition code: set when the accumulator is zero.
    pub fn condition(&self) -> bool {
        self.regs.condition()
    }

    /// One fetch-decode-execute cycle.
    ///
    /// Returns the resulting state transition and whether the PC wrapped
    /// past the last address.
    fn cycle(&mut self) -> (StepEvent, bool) {
        // Fetch
        let address = self.regs.pc;
        let word = self.mem.read(address);

        // Decode
        let (opcode, operand) = word.decode();

        // Execute
        let wrapped = self.execute(opcode, operand);

        let event = StepEvent {
            step: self.steps,
            address,
            word,
            opcode,
            operand: opcode.operand_required().then_some(operand),
            acc: self.regs.acc,
            pc: self.regs.pc,
            memory: self.mem.to_bytes(),
        };
        self.steps += 1;

        debug!(
            "{:02}: {} -> acc={} pc={}",
            address,
            event.label(),
            event.acc,
            event.pc
        );

        (event, wrapped)
    }

    /// Execute a single instruction.
    pub fn step(&mut self) -> StepEvent {
        self.cycle().0
    }

    /// Run the default 32-step budget without an observer.
    pub fn run_to_end(&mut self) -> RunReport {
        self.run(Termination::default(), &mut NullObserver)
    }

    /// Run until the termination condition is met or the observer aborts.
    pub fn run<O: Observer + ?Sized>(&mut self, termination: Termination, observer: &mut O) -> RunReport {
        let budget = match termination {
            Termination::Steps(steps) => steps,
            Termination::EndOfStore { max_steps } => max_steps,
        };
        let stop_at_end = matches!(termination, Termination::EndOfStore { .. });

        let mut trace = Vec::with_capacity(budget.min(STEP_BUDGET * 4));
        let mut outcome = RunOutcome::Completed;

        while trace.len() < budget {
            let (event, wrapped) = self.cycle();
            let control = observer.on_step(&event);
            trace.push(event);

            if control == Control::Abort {
                outcome = RunOutcome::Aborted;
                break;
            }

            if stop_at_end && wrapped {
                outcome = RunOutcome::EndOfStore;
                break;
            }

            // No pause after the final step.
            if let Control::ContinueAfter(delay) = control {
                if trace.len() < budget {
                    thread::sleep(delay);
                }
            }
        }

        info!("run finished after {} steps: {:?}", trace.len(), outcome);

        RunReport {
            outcome,
            steps: trace.len(),
            trace,
        }
    }

    /// Apply one decoded instruction.
    ///
    /// Returns `true` if the PC wrapped past the last address.
    fn execute(&mut self, opcode: Opcode, operand: u8) -> bool {
        match opcode {
            // ==================== Arithmetic ====================

            Opcode::Clear => {
                self.regs.acc = 0;
            }

            Opcode::Inc => {
                self.regs.acc = self.regs.acc.wrapping_add(1);
            }

            Opcode::Add => {
                self.regs.acc = self.regs.acc.wrapping_add(operand);
            }

            Opcode::Dec => {
                self.regs.acc = self.regs.acc.wrapping_sub(1);
            }

            // ==================== Control Flow ====================

            Opcode::Jmp => {
                self.regs.jump(operand);
                return false;
            }

            Opcode::BranchIfNonZero => {
                if !self.regs.condition() {
                    self.regs.jump(operand);
                    return false;
                }
            }

            // ==================== Data Transfer ====================

            Opcode::Load => {
                self.regs.acc = self.mem.read(operand).raw();
            }

            Opcode::Store => {
                self.mem.write(operand, Word::new(self.regs.acc));
            }
        }

        self.regs.advance_pc()
    }

}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("steps", &self.steps)
            .field("regs", &self.regs)
            .field("mem", &self.mem)
            .finish()
    }
}
