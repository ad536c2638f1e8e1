use crate::error::CompileFailure;

/// The compiler behind the REPL, seen as a single function.
///
/// Implementations must be deterministic enough that a failure is not
/// worth retrying: the controller shows the message and moves on.
pub trait CompileService {
    fn compile(&mut self, source: &str) -> Result<String, CompileFailure>;
}

impl<F> CompileService for F
where
    F: FnMut(&str) -> Result<String, CompileFailure>,
{
    fn compile(&mut self, source: &str) -> Result<String, CompileFailure> {
        self(source)
    }
}
