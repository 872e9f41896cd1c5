//! TUI application state and event loop.
//!
//! Two threads share one dashboard: the ingestion thread publishes snapshots
//! into it, this loop renders it. The loop waits at most 50 ms for input,
//! which is also the frame clock; a frame is only drawn when a snapshot
//! arrived or a setting changed since the previous one.

use std::io;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{debug, warn};
use ratatui::prelude::*;

use cubestat_core::CubestatError;
use cubestat_core::dashboard::{SharedDashboard, lock};

use super::palette::Palettes;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Why the event loop stopped.
#[derive(Debug)]
pub enum Exit {
    /// The user quit.
    Quit,
    /// Ingestion failed for good.
    Fatal(CubestatError),
}

pub struct App {
    dashboard: SharedDashboard,
    fatal: Receiver<CubestatError>,
    palettes: Palettes,
    running: bool,
}

impl App {
    pub fn new(
        dashboard: SharedDashboard,
        fatal: Receiver<CubestatError>,
        palettes: Palettes,
    ) -> Self {
        Self {
            dashboard,
            fatal,
            palettes,
            running: true,
        }
    }

    pub fn run(&mut self) -> io::Result<Exit> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        // Install panic hook that restores terminal before printing the panic.
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
            original_hook(info);
        }));

        let result = self.run_loop(&mut terminal);

        // Always restore terminal, even if the loop returned an error.
        let _ = std::panic::take_hook(); // remove our hook
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            crossterm::cursor::Show
        )?;

        result
    }

    fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<Exit> {
        while self.is_running() {
            match self.fatal.try_recv() {
                Ok(err) => return Ok(Exit::Fatal(err)),
                Err(TryRecvError::Empty) => {}
                // Ingestion ended without error; keep showing what we have.
                Err(TryRecvError::Disconnected) => {}
            }

            self.draw_if_changed(terminal);

            if event::poll(INPUT_POLL)? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
                    Event::Resize(cols, rows) => {
                        debug!("terminal resized to {cols}x{rows}");
                        lock(&self.dashboard).force_redraw();
                    }
                    _ => {}
                }
            }
        }
        Ok(Exit::Quit)
    }

    /// Draw a frame if anything changed since the last one. Returns whether a
    /// frame was drawn. A failed frame is logged and retried on the next tick.
    pub fn draw_if_changed<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> bool {
        let mut dashboard = lock(&self.dashboard);
        if !dashboard.needs_redraw() {
            return false;
        }
        let palettes = &self.palettes;
        if let Err(e) = terminal.draw(|f| super::ui::draw(f, &dashboard, palettes)) {
            warn!("dropping frame: {e}");
            return false;
        }
        dashboard.mark_rendered();
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.running = false;
            return;
        }
        let mut d = lock(&self.dashboard);
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => self.running = false,
            KeyCode::Char('v') => d.cycle_view(true),
            KeyCode::Char('V') => d.cycle_view(false),
            KeyCode::Char('t') => d.cycle_theme(true),
            KeyCode::Char('T') => d.cycle_theme(false),
            KeyCode::Up => d.scroll_up(),
            KeyCode::Down => d.scroll_down(),
            KeyCode::Left => d.scroll_back(),
            KeyCode::Right => d.scroll_forward(),
            KeyCode::Char('0') => d.reset_shifts(),
            KeyCode::Char(c) => {
                d.cycle_group(c);
            }
            _ => {}
        }
    }
}
