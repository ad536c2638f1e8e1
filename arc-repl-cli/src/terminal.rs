//! crossterm-backed terminal for interactive sessions.

use std::io::{self, Write};

use arc_repl_core::Terminal;
use crossterm::cursor::{self, MoveTo};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, ScrollUp};
use crossterm::{execute, queue};

pub struct CrosstermTerminal<W: Write> {
    writer: W,
}

impl CrosstermTerminal<io::Stdout> {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }
}

impl<W: Write> CrosstermTerminal<W> {
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> Terminal for CrosstermTerminal<W> {
    fn write(&mut self, text: &str) -> io::Result<()> {
        execute!(self.writer, Print(text))
    }

    /// Clear screen and scrollback but keep the line being edited, moved
    /// to the top row.
    fn clear(&mut self) -> io::Result<()> {
        let (column, row) = cursor::position()?;
        if row > 0 {
            queue!(self.writer, ScrollUp(row))?;
        }
        queue!(
            self.writer,
            MoveTo(column, 0),
            Clear(ClearType::FromCursorDown),
            Clear(ClearType::Purge)
        )?;
        self.writer.flush()
    }
}

/// Raw mode for the lifetime of the guard.
pub struct RawModeGuard {
    _private: (),
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self { _private: () })
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(err) = terminal::disable_raw_mode() {
            tracing::warn!(error = %err, "failed to leave raw mode");
        }
    }
}
