//! Drives a [`ReplController`] from a [`KeySource`] until input ends.

use anyhow::Result;
use arc_repl_core::{CompileService, ReplController, SessionStats, Terminal};

use crate::input::KeySource;

pub fn run<S, T, K>(repl: &mut ReplController<S, T>, keys: &mut K) -> Result<SessionStats>
where
    S: CompileService,
    T: Terminal,
    K: KeySource,
{
    repl.start()?;
    while let Some(key) = keys.next_key()? {
        repl.handle_key(&key)?;
    }
    let stats = repl.stats();
    tracing::info!(
        submitted = stats.submitted,
        compiled = stats.compiled,
        failed = stats.failed,
        "repl session ended"
    );
    Ok(stats)
}
