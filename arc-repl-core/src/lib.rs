//! Core of the arc-script REPL.
//!
//! This crate holds the line-buffered REPL loop that sits between an
//! interactive terminal and an opaque compiler. The flow is roughly:
//!
//!   key event (host terminal)
//!     -> keys        (classification into a KeyAction)
//!     -> controller  (pending line, submit / erase / clear)
//!     -> service     (CompileService::compile)
//!     -> terminal    (Terminal::write)
//!
//! The compiler itself is not part of this crate. Hosts (the CLI, the wasm
//! adapter) plug into the `CompileService` and `Terminal` seams.

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Input: key events and the pending line
// ---------------------------------------------------------------------

pub mod keys;
pub mod line;

// ---------------------------------------------------------------------
// Collaborators: compile service and terminal display
// ---------------------------------------------------------------------

pub mod service;
pub mod terminal;

// ---------------------------------------------------------------------
// The REPL loop
// ---------------------------------------------------------------------

pub mod controller;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use controller::{ReplConfig, ReplController, SessionStats, normalize_newlines};
pub use error::{CompileFailure, ReplError};
pub use keys::{Key, KeyAction, KeyEvent, Modifiers, classify};
pub use line::PendingLine;
pub use service::CompileService;
pub use terminal::{StreamTerminal, Terminal};
