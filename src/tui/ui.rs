//! UI rendering for the visualizer.
//!
//! Layout follows the PATP front panel: the main store as two banks of
//! sixteen 8-bit rows with a marker beside the executed row, then the data
//! register (blue), condition code (red) and program counter (green).

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
    style::{Color, Style, Modifier},
};
use crate::cpu::MEMORY_SIZE;
use crate::cpu::word::WORD_BITS;
use super::app::{Mode, VisualizerApp};

const CELL: &str = "██";

const BANK_ROWS: usize = MEMORY_SIZE / 2;

/// Dim variants used for cleared bits.
const DIM_BLUE: Color = Color::Rgb(0x00, 0x00, 0x40);
const DIM_RED: Color = Color::Rgb(0x40, 0x00, 0x00);
const DIM_GREEN: Color = Color::Rgb(0x00, 0x40, 0x00);

/// Bits of the program counter.
const PC_BITS: u32 = 5;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &VisualizerApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(BANK_ROWS as u16 + 2),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .split(frame.area());

    let banks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Percentage(50),
        ])
        .split(chunks[0]);

    draw_bank(frame, banks[0], app, 0);
    draw_bank(frame, banks[1], app, BANK_ROWS);
    draw_registers(frame, chunks[1], app);
    draw_status(frame, chunks[2], app);
    draw_help(frame, chunks[3]);
}

fn cell(on: bool, lit: Color, dim: Color) -> Span<'static> {
    Span::styled(CELL, Style::default().fg(if on { lit } else { dim }))
}

/// Cells for the low `bits` bits of `value`, most significant first.
fn bit_cells(value: u8, bits: u32, lit: Color, dim: Color) -> Vec<Span<'static>> {
    (0..bits)
        .rev()
        .flat_map(|bit| [cell(value & (1 << bit) != 0, lit, dim), Span::raw(" ")])
        .collect()
}

/// Draw sixteen memory rows starting at `first`.
fn draw_bank(frame: &mut Frame, area: Rect, app: &VisualizerApp, first: usize) {
    let rows: Vec<Line> = (first..first + BANK_ROWS)
        .map(|addr| {
            let executed = app.executed == Some(addr as u8);

            let marker = if executed {
                Span::styled(CELL, Style::default().fg(Color::Green))
            } else {
                Span::raw("  ")
            };

            let mut spans = vec![
                marker,
                Span::styled(format!(" {:2} ", addr), Style::default().fg(Color::DarkGray)),
            ];
            spans.extend(bit_cells(app.memory[addr], WORD_BITS, Color::White, Color::DarkGray));

            Line::from(spans)
        })
        .collect();

    let title = if first == 0 { " Memory 0-15 " } else { " Memory 16-31 " };
    let paragraph = Paragraph::new(rows)
        .block(Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(paragraph, area);
}

/// Draw ACC, the condition code and PC as lamps.
fn draw_registers(frame: &mut Frame, area: Rect, app: &VisualizerApp) {
    let mut acc = vec![Span::raw("ACC ")];
    acc.extend(bit_cells(app.acc, WORD_BITS, Color::Blue, DIM_BLUE));
    acc.push(Span::raw(format!(" = {:3}", app.acc)));

    let mut flags = vec![
        Span::raw("CCR "),
        cell(app.condition(), Color::Red, DIM_RED),
        Span::raw("   PC "),
    ];
    flags.extend(bit_cells(app.pc, PC_BITS, Color::Green, DIM_GREEN));
    flags.push(Span::raw(format!(" = {:2}", app.pc)));

    let last = app.last_label.as_deref().unwrap_or("-");
    let info = Line::from(vec![
        Span::raw("Step: "),
        Span::styled(format!("{}", app.steps), Style::default().fg(Color::Cyan)),
        Span::raw("   Last: "),
        Span::styled(last.to_string(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
    ]);

    let paragraph = Paragraph::new(vec![Line::from(acc), Line::from(flags), info])
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &VisualizerApp) {
    let style = match (app.finished, app.mode) {
        (true, _) => Style::default().fg(Color::Yellow),
        (false, Mode::Playing) => Style::default().fg(Color::Green),
        (false, Mode::Paused) => Style::default().fg(Color::White),
    };

    let status = Paragraph::new(app.status.clone())
        .style(style)
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(Line::from("Enter: Step  Space: Play/Pause  Esc/q: Quit"))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default()
            .title(" Help ")
            .borders(Borders::ALL));

    frame.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;
    use crate::cpu::{Cpu, Opcode, Word};
    use crate::tui::app::DEFAULT_PLAY_DELAY;

    #[test]
    fn test_bit_cells_order() {
        let spans = bit_cells(0b100, 3, Color::Green, DIM_GREEN);
        let lit: Vec<bool> = spans
            .iter()
            .filter(|s| s.content == CELL)
            .map(|s| s.style.fg == Some(Color::Green))
            .collect();
        assert_eq!(lit, vec![true, false, false]);
    }

    #[test]
    fn test_draw_renders_panels() {
        let mut cpu = Cpu::new();
        cpu.load_program(&[Word::encode(Opcode::Add, 5)]).unwrap();
        let mut app = VisualizerApp::new(&cpu, DEFAULT_PLAY_DELAY);
        app.record(&cpu.step());

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal.draw(|frame| draw(frame, &app)).unwrap();

        let buffer = terminal.backend().buffer();
        let text: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(text.contains("Memory 0-15"));
        assert!(text.contains("Registers"));
        assert!(text.contains("Add 5"));
    }
}
