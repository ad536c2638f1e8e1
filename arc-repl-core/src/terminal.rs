//! The display side of the REPL.
//!
//! A [`Terminal`] is a character-cell surface that understands carriage
//! return, line feed and backspace. Cursor tracking and wrapping belong to
//! the implementation; the controller only writes text.

use std::io::{self, Write};

/// ANSI sequence used by stream terminals to clear the screen.
pub const CLEAR_SEQUENCE: &str = "\x1b[2J\x1b[H";

pub trait Terminal {
    fn write(&mut self, text: &str) -> io::Result<()>;

    /// Write `text` followed by a carriage return and line feed.
    fn writeln(&mut self, text: &str) -> io::Result<()> {
        self.write(text)?;
        self.write("\r\n")
    }

    fn clear(&mut self) -> io::Result<()>;
}

impl<T: Terminal + ?Sized> Terminal for &mut T {
    fn write(&mut self, text: &str) -> io::Result<()> {
        (**self).write(text)
    }

    fn writeln(&mut self, text: &str) -> io::Result<()> {
        (**self).writeln(text)
    }

    fn clear(&mut self) -> io::Result<()> {
        (**self).clear()
    }
}

/// A terminal backed by a plain byte stream.
///
/// Used for piped sessions and in tests (with a `Vec<u8>` writer). Every
/// write is flushed so that output interleaves correctly with the input
/// that produced it.
#[derive(Debug, Default)]
pub struct StreamTerminal<W: Write> {
    writer: W,
}

impl<W: Write> StreamTerminal<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl StreamTerminal<Vec<u8>> {
    /// Everything written so far, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.writer).into_owned()
    }
}

impl<W: Write> Terminal for StreamTerminal<W> {
    fn write(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }

    fn clear(&mut self) -> io::Result<()> {
        self.write(CLEAR_SEQUENCE)
    }
}
