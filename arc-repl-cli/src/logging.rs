//! tracing setup for the `arc-repl` binary.
//!
//! `RUST_LOG` wins over `--log-level`. Logs go to stderr unless a log file
//! is given; in interactive sessions a file keeps them off the screen.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter {level:?}"))?,
    };

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let layer = fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            tracing_subscriber::registry()
                .with(layer.with_filter(filter))
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
        None => {
            let layer = fmt::layer().with_target(false).with_writer(io::stderr);
            tracing_subscriber::registry()
                .with(layer.with_filter(filter))
                .try_init()
                .context("failed to install tracing subscriber")?;
        }
    }
    Ok(())
}
