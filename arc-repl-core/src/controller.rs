//! The line-buffered REPL loop.
//!
//! One [`ReplController`] lives for a whole session. It owns the pending
//! line and talks to exactly two collaborators: the compile service and
//! the terminal. Hosts feed it key events one at a time.

use unicode_width::UnicodeWidthStr;

use crate::error::ReplError;
use crate::keys::{KeyAction, KeyEvent, classify};
use crate::line::PendingLine;
use crate::service::CompileService;
use crate::terminal::Terminal;

pub const DEFAULT_PROMPT: &str = "$ ";
pub const DEFAULT_BANNER: &str = "This is a REPL for the arc-script language.";

/// Erases one cell to the left of the cursor.
const ERASE_CELL: &str = "\x08 \x08";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Text shown after the line break that starts every new input line.
    pub prompt: String,
    /// Line written once by [`ReplController::start`].
    pub banner: Option<String>,
    /// Re-issue the prompt after Ctrl-L. Off by default: the browser
    /// terminal only cleared the screen and left the prompt line as is.
    pub reprompt_on_clear: bool,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: DEFAULT_PROMPT.to_string(),
            banner: Some(DEFAULT_BANNER.to_string()),
            reprompt_on_clear: false,
        }
    }
}

/// Counters kept for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub submitted: usize,
    pub compiled: usize,
    pub failed: usize,
}

pub struct ReplController<S, T> {
    service: S,
    terminal: T,
    config: ReplConfig,
    pending: PendingLine,
    stats: SessionStats,
}

impl<S: CompileService, T: Terminal> ReplController<S, T> {
    pub fn new(service: S, terminal: T, config: ReplConfig) -> Self {
        Self {
            service,
            terminal,
            config,
            pending: PendingLine::new(),
            stats: SessionStats::default(),
        }
    }

    /// Write the banner (if any) and the first prompt.
    pub fn start(&mut self) -> Result<(), ReplError> {
        if let Some(banner) = &self.config.banner {
            self.terminal.writeln(banner)?;
        }
        self.prompt()?;
        tracing::info!(prompt = %self.config.prompt, "repl session started");
        Ok(())
    }

    /// Handle one key event to completion.
    pub fn handle_key(&mut self, event: &KeyEvent) -> Result<KeyAction, ReplError> {
        let action = classify(event);
        tracing::trace!(?event, ?action, "key");
        match action {
            KeyAction::Submit => self.submit()?,
            KeyAction::Erase => self.erase()?,
            KeyAction::ClearScreen => self.clear_screen()?,
            KeyAction::Insert(c) => self.insert(c)?,
            KeyAction::Ignore => {}
        }
        Ok(action)
    }

    /// Column of the cursor on the current input line.
    pub fn cursor_column(&self) -> usize {
        self.prompt_width() + self.pending.display_width()
    }

    pub fn prompt_width(&self) -> usize {
        self.config.prompt.width()
    }

    pub fn pending_line(&self) -> &str {
        self.pending.as_str()
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn terminal(&self) -> &T {
        &self.terminal
    }

    pub fn into_parts(self) -> (S, T) {
        (self.service, self.terminal)
    }

    fn prompt(&mut self) -> Result<(), ReplError> {
        self.terminal.write("\r\n")?;
        self.terminal.write(&self.config.prompt)?;
        Ok(())
    }

    fn submit(&mut self) -> Result<(), ReplError> {
        if self.pending.is_empty() {
            return self.prompt();
        }

        let input = self.pending.take();
        self.stats.submitted += 1;
        self.terminal.writeln("")?;

        let message = match self.service.compile(&input) {
            Ok(output) => {
                self.stats.compiled += 1;
                tracing::debug!(input_len = input.len(), output_len = output.len(), "compiled");
                normalize_newlines(&output)
            }
            Err(failure) => {
                self.stats.failed += 1;
                tracing::debug!(input_len = input.len(), error = %failure, "compile failed");
                failure.message
            }
        };

        self.terminal.write(&message)?;
        self.prompt()
    }

    /// The pending line is checked rather than the column so that a line
    /// holding only zero-width characters can still be emptied.
    fn erase(&mut self) -> Result<(), ReplError> {
        let Some(cells) = self.pending.pop_cluster() else {
            return Ok(());
        };
        for _ in 0..cells {
            self.terminal.write(ERASE_CELL)?;
        }
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<(), ReplError> {
        self.terminal.clear()?;
        if self.config.reprompt_on_clear {
            // The pending line survives a clear, so put it back after the prompt.
            self.prompt()?;
            let pending = self.pending.as_str().to_string();
            self.terminal.write(&pending)?;
        }
        Ok(())
    }

    fn insert(&mut self, c: char) -> Result<(), ReplError> {
        self.pending.push(c);
        let mut buf = [0u8; 4];
        self.terminal.write(c.encode_utf8(&mut buf))?;
        Ok(())
    }
}

/// Turn compiler output into something the terminal renders line by line.
///
/// Every `\n` becomes `\n\r`, so each line starts at column zero.
pub fn normalize_newlines(output: &str) -> String {
    output.replace('\n', "\n\r")
}
