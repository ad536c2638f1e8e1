use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use arc_repl_core::CompileFailure;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to read module {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid wasm module: {0}")]
    InvalidModule(String),
    #[error("failed to instantiate module: {0}")]
    Instantiate(String),
    #[error("module does not export {kind} `{name}`")]
    MissingExport { kind: &'static str, name: String },
    #[error("export `{name}` has an unexpected signature")]
    Signature { name: String },
    #[error("memory access failed: {0}")]
    Memory(String),
    #[error("stack pointer: {0}")]
    StackPointer(String),
    #[error("{0}")]
    Trap(String),
    #[error("compiler returned invalid UTF-8: {0}")]
    InvalidUtf8(#[from] FromUtf8Error),
}

impl HostError {
    /// Whether the module instance may be left in an inconsistent state.
    pub fn poisons_instance(&self) -> bool {
        !matches!(self, HostError::InvalidUtf8(_))
    }
}

impl From<HostError> for CompileFailure {
    fn from(err: HostError) -> Self {
        CompileFailure::new(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_decoding_errors_keep_the_instance() {
        let utf8 = String::from_utf8(vec![0xff]).unwrap_err();
        assert!(!HostError::InvalidUtf8(utf8).poisons_instance());
        assert!(HostError::Trap("unreachable".into()).poisons_instance());
    }

    #[test]
    fn trap_message_becomes_failure_text() {
        let failure = CompileFailure::from(HostError::Trap("stack overflow".into()));
        assert_eq!(failure.message, "stack overflow");
    }
}
