//! Terminal reporter.
//!
//! Everything goes to stderr. The in-place progress line is only drawn when
//! stderr is a terminal; piped output gets the phase and result lines alone.

use std::io::{self, IsTerminal, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crossterm::{
    QueueableCommand,
    cursor::MoveToColumn,
    style::{Color, Stylize, style},
    terminal::{Clear, ClearType},
};
use mozdl_core::Reporter;

use super::Theme;
use super::progress::{format_entries, format_transfer};

/// Minimum time between two redraws of the progress line.
const REDRAW_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct ConsoleReporter {
    theme: Theme,
    interactive: bool,
    line: Mutex<LineState>,
}

#[derive(Debug, Default)]
struct LineState {
    last_draw: Option<Instant>,
    /// A progress line is on screen and must be cleared before printing
    dirty: bool,
}

impl LineState {
    fn should_redraw(&mut self, now: Instant, complete: bool) -> bool {
        let recent = self
            .last_draw
            .is_some_and(|t| now.duration_since(t) < REDRAW_INTERVAL);
        if recent && !complete {
            return false;
        }
        self.last_draw = Some(now);
        true
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::with_theme(Theme::default(), io::stderr().is_terminal())
    }

    pub fn with_theme(theme: Theme, interactive: bool) -> Self {
        Self {
            theme,
            interactive,
            line: Mutex::new(LineState::default()),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.interactive {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn lock(&self) -> MutexGuard<'_, LineState> {
        self.line.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn print_line(&self, icon: &str, color: Color, msg: &str) {
        let mut state = self.lock();
        let mut err = io::stderr().lock();
        if state.dirty {
            let _ = clear_line(&mut err);
            state.dirty = false;
            state.last_draw = None;
        }
        let _ = writeln!(err, "{} {msg}", self.paint(icon, color));
    }

    fn draw_progress(&self, text: &str, complete: bool) {
        if !self.interactive {
            return;
        }
        let mut state = self.lock();
        if !state.should_redraw(Instant::now(), complete) {
            return;
        }
        let mut err = io::stderr().lock();
        let drawn = clear_line(&mut err)
            .and_then(|()| write!(err, "  {}", self.paint(text, self.theme.colors.secondary)))
            .and_then(|()| err.flush());
        state.dirty = drawn.is_ok();
    }
}

fn clear_line(out: &mut impl Write) -> io::Result<()> {
    out.queue(MoveToColumn(0))?
        .queue(Clear(ClearType::CurrentLine))?;
    Ok(())
}

impl Reporter for ConsoleReporter {
    fn phase(&self, title: &str) {
        self.print_line(self.theme.icons.active, self.theme.colors.phase, title);
    }

    fn downloading(&self, current: u64, total: Option<u64>) {
        let complete = total.is_some_and(|t| current >= t);
        self.draw_progress(&format_transfer(current, total), complete);
    }

    fn extracting(&self, current: u64, total: Option<u64>) {
        let complete = total.is_some_and(|t| current >= t);
        self.draw_progress(&format_entries(current, total), complete);
    }

    fn done(&self, detail: &str) {
        self.print_line(self.theme.icons.success, self.theme.colors.success, detail);
    }

    fn failed(&self, reason: &str) {
        self.print_line(self.theme.icons.error, self.theme.colors.error, reason);
    }

    fn info(&self, msg: &str) {
        self.print_line(self.theme.icons.info, self.theme.colors.secondary, msg);
    }

    fn warning(&self, msg: &str) {
        self.print_line(self.theme.icons.warning, self.theme.colors.warning, msg);
    }
}
