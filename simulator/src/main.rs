//! # `lc3-sim` — a TUI debugger for the LC-3 virtual machine
//!
//! Loads an object file produced by `lc3as` and lets you single-step or
//! free-run it while watching registers, a window of memory around `PC`,
//! and anything the program writes to the console. The core execution
//! loop never touches a terminal directly; it only ever calls through
//! `lc3_assembler::vm::console::ConsoleIo`, which this binary implements
//! once for a real terminal.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, ExecutableCommand};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};
use ratatui::{Frame, Terminal};

use lc3_assembler::isa;
use lc3_assembler::vm::console::ConsoleIo;
use lc3_assembler::vm::{HaltReason, Machine, VmError};

/// Single-step or free-run an LC-3 object file in a terminal UI.
#[derive(Parser, Debug)]
#[command(name = "lc3-sim", version, about)]
struct Args {
    /// Path to a `.obj` file produced by `lc3as`.
    object: PathBuf,
}

/// A `ConsoleIo` that buffers everything `OUT`/`PUTS`/`PUTSP` write for the
/// TUI to render, and blocks on a real key read for `GETC`/`IN` — the only
/// suspension point in the whole VM.
struct TuiConsole {
    output: String,
}

impl ConsoleIo for TuiConsole {
    fn read_byte(&mut self) -> io::Result<u8> {
        let mut buf = [0u8; 1];
        io::stdin().read_exact(&mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.push(byte as char);
        Ok(())
    }
}

/// Why the run loop most recently stopped advancing, for the status line.
enum Status {
    Ready,
    Halted(HaltReason),
    Errored(VmError),
}

struct App {
    machine: Machine,
    console: TuiConsole,
    status: Status,
    free_running: bool,
}

impl App {
    fn load(bytes: &[u8]) -> Self {
        let origin = if bytes.len() >= 2 {
            u16::from_be_bytes([bytes[0], bytes[1]])
        } else {
            isa::DEFAULT_ORIGIN
        };
        let mut machine = Machine::new();
        if bytes.len() > 2 {
            machine.load_memory(&bytes[2..], origin);
        }
        machine.registers[isa::R_PC] = origin;
        Self {
            machine,
            console: TuiConsole { output: String::new() },
            status: Status::Ready,
            free_running: false,
        }
    }

    fn finished(&self) -> bool {
        !matches!(self.status, Status::Ready)
    }

    fn step(&mut self) {
        if self.finished() {
            return;
        }
        match self.machine.step(&mut self.console) {
            Ok(Some(reason)) => self.status = Status::Halted(reason),
            Ok(None) => {}
            Err(err) => self.status = Status::Errored(err),
        }
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    let bytes = fs::read(&args.object)?;
    let mut app = App::load(&bytes);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(io::stdout(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, app))?;

        if app.free_running && !app.finished() {
            app.step();
            if !event::poll(Duration::from_millis(5))? {
                continue;
            }
        } else if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('s') | KeyCode::Char(' ') => {
                    app.free_running = false;
                    app.step();
                }
                KeyCode::Char('r') => app.free_running = !app.free_running && !app.finished(),
                _ => {}
            }
        }
    }
}

fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(area);

    draw_registers(frame, chunks[0], app);
    draw_memory(frame, chunks[1], app);
    draw_console(frame, chunks[2], app);
    draw_status(frame, chunks[3], app);
}

fn draw_registers(frame: &mut Frame, area: Rect, app: &App) {
    let regs = &app.machine.registers;
    let cells: Vec<Cell> = isa::REGISTER_NAMES
        .iter()
        .enumerate()
        .map(|(i, name)| Cell::from(format!("{}={:#06x}", name, regs[i])))
        .collect();
    let row = Row::new(cells);
    let widths = [Constraint::Length(12); isa::NUM_REGISTERS];
    let table = Table::new(vec![row], widths)
        .block(Block::default().title("registers").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_memory(frame: &mut Frame, area: Rect, app: &App) {
    let pc = app.machine.pc();
    let window_start = pc.saturating_sub(4);
    let rows: Vec<Row> = (0..(area.height.saturating_sub(2)))
        .map(|i| window_start.wrapping_add(i as u16))
        .map(|addr| {
            let word = app.machine.memory[addr as usize];
            let marker = if addr == pc { ">" } else { " " };
            let style = if addr == pc {
                Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format!("{}{:#06x}", marker, addr)),
                Cell::from(format!("{:#06x}", word)),
                Cell::from(format!("{:016b}", word)),
            ])
            .style(style)
        })
        .collect();
    let widths = [Constraint::Length(8), Constraint::Length(8), Constraint::Length(18)];
    let table = Table::new(rows, widths)
        .header(Row::new(vec!["addr", "word", "bits"]))
        .block(Block::default().title("memory").borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn draw_console(frame: &mut Frame, area: Rect, app: &App) {
    let paragraph = Paragraph::new(app.console.output.as_str())
        .wrap(Wrap { trim: false })
        .block(Block::default().title("console").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let text = match &app.status {
        Status::Ready if app.free_running => Line::from(Span::styled(
            "running — press q to quit",
            Style::default().fg(Color::Green),
        )),
        Status::Ready => Line::from("ready — s/space: step, r: run, q: quit"),
        Status::Halted(HaltReason::Trap) => {
            Line::from(Span::styled("halted (TRAP x25)", Style::default().fg(Color::Cyan)))
        }
        Status::Halted(HaltReason::EndOfMemory) => Line::from(Span::styled(
            "halted (end of memory)",
            Style::default().fg(Color::Cyan),
        )),
        Status::Errored(err) => {
            Line::from(Span::styled(err.to_string(), Style::default().fg(Color::Red)))
        }
    };
    let paragraph = Paragraph::new(text).block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}
