use std::io;

use thiserror::Error;

/// The compiler rejected a line. The message is shown to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileFailure {
    pub message: String,
}

impl CompileFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors that end a REPL session.
///
/// Compile failures are never part of this type: the controller renders
/// them and keeps going.
#[derive(Debug, Error)]
pub enum ReplError {
    #[error("failed to write to terminal: {0}")]
    Terminal(#[from] io::Error),
}
