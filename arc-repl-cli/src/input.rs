//! Sources of key events: the real terminal, or bytes piped into stdin.

use std::collections::VecDeque;
use std::io::BufRead;

use anyhow::{Context, Result};
use arc_repl_core::{Key, KeyEvent, Modifiers};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// Produces key events until the session should end.
pub trait KeySource {
    /// The next key event, or `None` once input is exhausted or the user
    /// asked to quit.
    fn next_key(&mut self) -> Result<Option<KeyEvent>>;
}

/// Key events from the terminal in raw mode. Ctrl-C and Ctrl-D end the
/// session here and never reach the controller.
#[derive(Debug, Default)]
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> Result<Option<KeyEvent>> {
        loop {
            match event::read().context("failed to read terminal event")? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if is_exit_chord(&key) {
                        tracing::debug!("exit requested");
                        return Ok(None);
                    }
                    return Ok(Some(translate(&key)));
                }
                Event::Resize(columns, rows) => {
                    tracing::debug!(columns, rows, "terminal resized");
                }
                _ => {}
            }
        }
    }
}

pub fn is_exit_chord(key: &event::KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c' | 'C' | 'd' | 'D'))
}

/// Map a crossterm key event onto the REPL's key model.
///
/// crossterm has no AltGr flag; platforms that report AltGr as Ctrl+Alt
/// end up with both flags set, which the controller ignores all the same.
pub fn translate(key: &event::KeyEvent) -> KeyEvent {
    let logical = match key.code {
        KeyCode::Enter => Key::Enter,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Char(c) => Key::Char(c),
        _ => Key::Other,
    };

    let mut modifiers = Modifiers::empty();
    if key.modifiers.contains(KeyModifiers::ALT) {
        modifiers |= Modifiers::ALT;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CTRL;
    }
    if key.modifiers.intersects(KeyModifiers::SUPER | KeyModifiers::META) {
        modifiers |= Modifiers::META;
    }
    KeyEvent::new(logical, modifiers)
}

/// Key events decoded from a byte stream, one line at a time. Bytes that
/// are not valid UTF-8 come through as U+FFFD.
pub struct StreamKeys<R: BufRead> {
    reader: R,
    buffered: VecDeque<char>,
}

impl<R: BufRead> StreamKeys<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffered: VecDeque::new(),
        }
    }
}

impl<R: BufRead> KeySource for StreamKeys<R> {
    fn next_key(&mut self) -> Result<Option<KeyEvent>> {
        loop {
            while let Some(c) = self.buffered.pop_front() {
                if let Some(key) = decode_char(c) {
                    return Ok(Some(key));
                }
            }
            let mut line = Vec::new();
            let read = self
                .reader
                .read_until(b'\n', &mut line)
                .context("failed to read input")?;
            if read == 0 {
                return Ok(None);
            }
            self.buffered.extend(String::from_utf8_lossy(&line).chars());
        }
    }
}

/// What a character typed into a plain terminal means to the REPL.
pub fn decode_char(c: char) -> Option<KeyEvent> {
    match c {
        '\n' => Some(KeyEvent::enter()),
        '\u{8}' | '\u{7f}' => Some(KeyEvent::backspace()),
        '\u{c}' => Some(KeyEvent::ctrl('l')),
        c if c.is_control() => None,
        c => Some(KeyEvent::char(c)),
    }
}
