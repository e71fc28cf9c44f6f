//! PATP Emulator - CLI Entry Point
//!
//! Usage:
//! - `patp-emu <program>` - Run a program and print its trace and final memory
//! - `patp-emu --visual <program>` - Step through a program on a terminal front panel
//! - `patp-emu --disasm <program>` - Print an annotated listing of the loaded memory
//! - `patp-emu --disasm=source <program>` - Print the loaded memory as re-loadable source

use std::io;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use log::info;

use patp::asm::{disassemble, load_file, to_source, LoadError, ParseMode};
use patp::trace::{ConsoleTrace, Format};
use patp::{Cpu, Memory, Termination, STEP_BUDGET};

#[derive(Parser)]
#[command(name = "patp-emu")]
#[command(version)]
#[command(about = "An interpreter and step visualizer for the PATP 8-bit teaching computer")]
struct Cli {
    /// Path to the program source file
    program: Option<PathBuf>,

    /// Reject missing, malformed or out-of-range operands instead of reading them as 0
    #[arg(long)]
    strict: bool,

    /// Stop when the PC runs past address 31 instead of after 32 steps
    #[arg(long)]
    until_end: bool,

    /// Step limit for --until-end
    #[arg(long, default_value_t = 1024)]
    max_steps: usize,

    /// Milliseconds to wait after each traced step
    #[arg(long, default_value_t = 0)]
    delay: u64,

    /// Trace output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Show the interactive front panel
    #[cfg(feature = "tui")]
    #[arg(short = 'g', long)]
    visual: bool,

    /// Milliseconds between steps in play mode
    #[cfg(feature = "tui")]
    #[arg(long, default_value_t = patp::tui::DEFAULT_PLAY_DELAY.as_millis() as u64)]
    play_delay: u64,

    /// Print the loaded program and exit
    #[arg(long, value_enum, num_args = 0..=1, require_equals = true, default_missing_value = "listing")]
    disasm: Option<DisasmStyle>,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// No log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Step labels and a binary memory dump
    Text,
    /// One JSON object per step, then a summary
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DisasmStyle {
    /// Address, mnemonic and binary word for every cell
    Listing,
    /// Source text that loads back to the same memory
    Source,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
        }
    }
}

impl Cli {
    fn visual(&self) -> bool {
        #[cfg(feature = "tui")]
        return self.visual;
        #[cfg(not(feature = "tui"))]
        return false;
    }

    fn termination(&self) -> Termination {
        if self.until_end {
            Termination::EndOfStore { max_steps: self.max_steps }
        } else {
            Termination::Steps(STEP_BUDGET)
        }
    }

    fn parse_mode(&self) -> ParseMode {
        if self.strict { ParseMode::Strict } else { ParseMode::Permissive }
    }
}

/// A failure reported on stderr before exiting.
#[derive(Debug, PartialEq, Eq)]
struct Failure {
    message: String,
    code: i32,
}

impl Failure {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), code: 1 }
    }
}

/// Load the program named on the command line.
fn load(path: Option<&Path>, mode: ParseMode) -> Result<Memory, Failure> {
    let path = path.ok_or_else(|| Failure::new("Error: No Script Given"))?;

    load_file(path, mode).map_err(|e| match e {
        LoadError::Io { source, .. } => {
            info!("open failed: {}", source);
            Failure::new("Error: Script Not Found")
        }
        e => Failure::new(format!("Error: {}", e)),
    })
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let mem = match load(cli.program.as_deref(), cli.parse_mode()) {
        Ok(mem) => mem,
        Err(failure) => {
            eprintln!("{}", failure.message);
            process::exit(failure.code);
        }
    };

    match cli.disasm {
        Some(DisasmStyle::Listing) => {
            print!("{}", disassemble(&mem));
            return;
        }
        Some(DisasmStyle::Source) => {
            print!("{}", to_source(&mem));
            return;
        }
        None => {}
    }

    let result = if cli.visual() {
        run_visual(&cli, mem)
    } else {
        run_console(&cli, mem)
    };

    if let Err(e) = result {
        if e.kind() != io::ErrorKind::BrokenPipe {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = if cli.quiet || cli.visual() {
        "off"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run_console(cli: &Cli, mem: Memory) -> io::Result<()> {
    let mut cpu = Cpu::with_memory(mem);
    let mut observer = ConsoleTrace::new(io::stdout().lock(), cli.format.into())
        .with_delay(Duration::from_millis(cli.delay));

    let report = cpu.run(cli.termination(), &mut observer);
    observer.finish(&cpu, &report)?;

    Ok(())
}

#[cfg(feature = "tui")]
fn run_visual(cli: &Cli, mem: Memory) -> io::Result<()> {
    let mut cpu = Cpu::with_memory(mem);

    let report = patp::run_visual(
        &mut cpu,
        cli.termination(),
        Duration::from_millis(cli.play_delay),
    )?;

    // The trace is printed once the terminal is back in normal mode.
    patp::trace::write_report(&mut io::stdout().lock(), cli.format.into(), &cpu, &report)
}

#[cfg(not(feature = "tui"))]
fn run_visual(cli: &Cli, mem: Memory) -> io::Result<()> {
    run_console(cli, mem)
}
