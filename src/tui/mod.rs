//! Terminal visualizer for the PATP emulator.
//!
//! Provides an interactive front panel with:
//! - Memory as a grid of lit and unlit bit cells
//! - Accumulator, condition code and program counter lamps
//! - Play/pause, single-step and quit controls

mod app;
mod ui;

pub use app::{run_visual, KeyAction, Mode, Visualizer, VisualizerApp, DEFAULT_PLAY_DELAY};
