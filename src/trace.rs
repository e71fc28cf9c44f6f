//! Console trace output.
//!
//! Text format, one line per step followed by a blank line and the final
//! memory dump in binary:
//!
//! ```text
//!  0: Add 3
//!  1: Store 10
//! ...
//!
//!  0: 01000011
//!  1: 11101010
//! ```
//!
//! JSON format writes one [`StepEvent`] object per line and then a
//! [`Summary`] object.

use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use crate::cpu::{Control, Cpu, Memory, Observer, RunOutcome, RunReport, StepEvent, MEMORY_SIZE};

/// Output format for the console trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Text,
    Json,
}

/// One trace line, e.g. `" 4: Branch 12"`.
pub fn format_step(event: &StepEvent) -> String {
    format!("{:2}: {}", event.step, event.label())
}

/// Memory dump, one `"NN: bbbbbbbb"` line per word.
pub fn format_memory(mem: &Memory) -> String {
    mem.dump()
        .map(|(addr, word)| format!("{:2}: {}\n", addr, word))
        .collect()
}

/// Final machine state written after a JSON trace.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub outcome: RunOutcome,
    pub steps: usize,
    pub acc: u8,
    pub pc: u8,
    pub memory: [u8; MEMORY_SIZE],
}

impl Summary {
    pub fn new(cpu: &Cpu, report: &RunReport) -> Self {
        Self {
            outcome: report.outcome,
            steps: report.steps,
            acc: cpu.regs.acc,
            pc: cpu.regs.pc,
            memory: cpu.mem.to_bytes(),
        }
    }
}

/// Observer that prints each step as it executes.
pub struct ConsoleTrace<W: Write> {
    out: W,
    format: Format,
    delay: Duration,
    error: Option<io::Error>,
}

impl<W: Write> ConsoleTrace<W> {
    /// Trace to `out` without pausing between steps.
    pub fn new(out: W, format: Format) -> Self {
        Self {
            out,
            format,
            delay: Duration::ZERO,
            error: None,
        }
    }

    /// Pause for `delay` after printing each step.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Write the end-of-run output and hand back the writer.
    ///
    /// Returns the first write error hit during the run, if any.
    pub fn finish(mut self, cpu: &Cpu, report: &RunReport) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        write_footer(&mut self.out, self.format, cpu, report)?;
        self.out.flush()?;

        Ok(self.out)
    }
}

impl<W: Write> Observer for ConsoleTrace<W> {
    fn on_step(&mut self, event: &StepEvent) -> Control {
        let written = write_event(&mut self.out, self.format, event).and_then(|()| self.out.flush());
        if let Err(err) = written {
            self.error = Some(err);
            return Control::Abort;
        }

        if self.delay.is_zero() {
            Control::Continue
        } else {
            Control::ContinueAfter(self.delay)
        }
    }
}

fn write_event<W: Write>(out: &mut W, format: Format, event: &StepEvent) -> io::Result<()> {
    match format {
        Format::Text => writeln!(out, "{}", format_step(event)),
        Format::Json => {
            serde_json::to_writer(&mut *out, event)?;
            writeln!(out)
        }
    }
}

fn write_footer<W: Write>(out: &mut W, format: Format, cpu: &Cpu, report: &RunReport) -> io::Result<()> {
    match format {
        Format::Text => {
            writeln!(out)?;
            write!(out, "{}", format_memory(&cpu.mem))
        }
        Format::Json => {
            serde_json::to_writer(&mut *out, &Summary::new(cpu, report))?;
            writeln!(out)
        }
    }
}

/// Write the trace of an already finished run.
pub fn write_report<W: Write>(out: &mut W, format: Format, cpu: &Cpu, report: &RunReport) -> io::Result<()> {
    for event in &report.trace {
        write_event(out, format, event)?;
    }
    write_footer(out, format, cpu, report)?;
    out.flush()
}
