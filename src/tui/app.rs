//! Visualizer application state and logic.

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;

use crate::cpu::{Control, Cpu, Observer, RunOutcome, RunReport, StepEvent, Termination, MEMORY_SIZE};

/// Delay between steps in play mode.
pub const DEFAULT_PLAY_DELAY: Duration = Duration::from_millis(250);

/// How often a paused visualizer wakes up to redraw.
const IDLE_POLL: Duration = Duration::from_millis(100);

/// Whether steps advance on their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Paused,
    Playing,
}

/// What a key press means for the waiting run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Keep waiting.
    Wait,
    /// Execute the next step.
    Proceed,
    /// Stop the run.
    Quit,
}

/// Visualizer application state.
pub struct VisualizerApp {
    /// Memory after the last step.
    pub memory: [u8; MEMORY_SIZE],
    /// Accumulator after the last step.
    pub acc: u8,
    /// Program counter after the last step.
    pub pc: u8,
    /// Address of the last executed instruction.
    pub executed: Option<u8>,
    /// Trace label of the last executed instruction.
    pub last_label: Option<String>,
    /// Steps executed so far.
    pub steps: usize,
    /// Play or pause.
    pub mode: Mode,
    /// Delay between steps while playing.
    pub play_delay: Duration,
    /// Status message to display.
    pub status: String,
    /// Has the run ended?
    pub finished: bool,
}

impl VisualizerApp {
    /// Create a visualizer showing the CPU's current state, paused.
    pub fn new(cpu: &Cpu, play_delay: Duration) -> Self {
        Self {
            memory: cpu.mem.to_bytes(),
            acc: cpu.regs.acc,
            pc: cpu.regs.pc,
            executed: None,
            last_label: None,
            steps: cpu.steps,
            mode: Mode::Paused,
            play_delay,
            status: "Paused. Enter: step, Space: play, Esc: quit.".into(),
            finished: false,
        }
    }

    /// Take the state from a step event.
    pub fn record(&mut self, event: &StepEvent) {
        self.memory = event.memory;
        self.acc = event.acc;
        self.pc = event.pc;
        self.executed = Some(event.address);
        self.last_label = Some(event.label());
        self.steps = event.step + 1;
        self.status = match self.mode {
            Mode::Paused => format!("Paused after step {}.", event.step),
            Mode::Playing => format!("Playing, step {}.", event.step),
        };
    }

    /// The condition code: set when the accumulator is zero.
    pub fn condition(&self) -> bool {
        self.acc == 0
    }

    /// React to a key press while waiting between steps.
    pub fn handle_key(&mut self, key: KeyCode) -> KeyAction {
        match (self.mode, key) {
            (_, KeyCode::Esc | KeyCode::Char('q')) => KeyAction::Quit,
            (Mode::Paused, KeyCode::Enter) => KeyAction::Proceed,
            (Mode::Paused, KeyCode::Char(' ')) => {
                self.mode = Mode::Playing;
                self.status = "Playing.".into();
                KeyAction::Proceed
            }
            (Mode::Playing, KeyCode::Char(' ')) => {
                self.mode = Mode::Paused;
                self.status = format!("Paused after step {}.", self.steps.saturating_sub(1));
                KeyAction::Wait
            }
            (Mode::Playing, KeyCode::Enter) => KeyAction::Proceed,
            _ => KeyAction::Wait,
        }
    }

    /// Mark the run as over.
    pub fn finish(&mut self, report: &RunReport) {
        self.finished = true;
        self.status = match report.outcome {
            RunOutcome::Aborted => format!("Quit after {} steps.", report.steps),
            _ => format!("Finished after {} steps. Press any key to exit.", report.steps),
        };
    }
}

type Term = Terminal<CrosstermBackend<Stdout>>;

/// Observer that draws every step and waits for the user between steps.
pub struct Visualizer<'t> {
    terminal: &'t mut Term,
    /// Shared state drawn by the UI.
    pub app: VisualizerApp,
    error: Option<io::Error>,
}

impl<'t> Visualizer<'t> {
    pub fn new(terminal: &'t mut Term, app: VisualizerApp) -> Self {
        Self {
            terminal,
            app,
            error: None,
        }
    }

    fn draw(&mut self) -> io::Result<()> {
        let app = &self.app;
        self.terminal.draw(|frame| super::ui::draw(frame, app))?;
        Ok(())
    }

    /// Block until the user lets the next step run or quits.
    fn wait(&mut self) -> io::Result<KeyAction> {
        let deadline = Instant::now() + self.app.play_delay;

        loop {
            let timeout = match self.app.mode {
                Mode::Playing => {
                    let left = deadline.saturating_duration_since(Instant::now());
                    if left.is_zero() {
                        return Ok(KeyAction::Proceed);
                    }
                    left
                }
                Mode::Paused => IDLE_POLL,
            };

            if !event::poll(timeout)? {
                continue;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match self.app.handle_key(key.code) {
                    KeyAction::Wait => self.draw()?,
                    action => return Ok(action),
                }
            }
        }
    }

    fn observe(&mut self, event: &StepEvent) -> io::Result<Control> {
        self.app.record(event);
        self.draw()?;

        Ok(match self.wait()? {
            KeyAction::Quit => Control::Abort,
            _ => Control::Continue,
        })
    }

    /// Show the end of the run and, after a completed run in play mode,
    /// wait for a key so the final state can be inspected.
    pub fn finish(&mut self, report: &RunReport) -> io::Result<()> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }

        self.app.finish(report);
        self.draw()?;

        if report.outcome != RunOutcome::Aborted && self.app.mode == Mode::Playing {
            loop {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }

        Ok(())
    }
}

impl Observer for Visualizer<'_> {
    fn on_step(&mut self, event: &StepEvent) -> Control {
        match self.observe(event) {
            Ok(control) => control,
            Err(err) => {
                self.error = Some(err);
                Control::Abort
            }
        }
    }
}

/// Run a program under the visualizer.
///
/// The terminal is restored before returning, even if drawing failed.
pub fn run_visual(cpu: &mut Cpu, termination: Termination, play_delay: Duration) -> io::Result<RunReport> {
    use crossterm::{
        terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
        ExecutableCommand,
    };
    use std::io::stdout;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = Terminal::new(CrosstermBackend::new(stdout())).and_then(|mut terminal| {
        let app = VisualizerApp::new(cpu, play_delay);
        let mut visualizer = Visualizer::new(&mut terminal, app);

        let report = cpu.run(termination, &mut visualizer);
        visualizer.finish(&report)?;

        Ok(report)
    });

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}
