use std::io::{self, IsTerminal};
use std::path::PathBuf;

use anyhow::{Context, Result};
use arc_repl_core::controller::{DEFAULT_BANNER, DEFAULT_PROMPT};
use arc_repl_core::{CompileService, ReplConfig, ReplController, StreamTerminal, Terminal};
use arc_repl_wasm::host::DEFAULT_ENTRY;
use arc_repl_wasm::{HostOptions, WasmCompiler};
use clap::Parser;

mod input;
mod logging;
mod session;
mod terminal;

use input::{StreamKeys, TerminalKeys};
use terminal::{CrosstermTerminal, RawModeGuard};

/// Line-buffered REPL over a compiler shipped as a wasm-bindgen module.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[arg(short, long, value_name = "PATH", help = "Compiler module (.wasm)")]
    module: PathBuf,

    #[arg(
        long,
        value_name = "NAME",
        default_value = DEFAULT_ENTRY,
        help = "Exported `(source) -> string` entry point"
    )]
    entry: String,

    #[arg(
        short,
        long,
        value_name = "SOURCE",
        help = "Compile SOURCE once, print the result and exit"
    )]
    eval: Option<String>,

    #[arg(long, value_name = "TEXT", default_value = DEFAULT_PROMPT)]
    prompt: String,

    #[arg(long, value_name = "TEXT", default_value = DEFAULT_BANNER)]
    banner: String,

    #[arg(long, help = "Do not print the banner line")]
    no_banner: bool,

    #[arg(long, help = "Print a fresh prompt after Ctrl-L")]
    reprompt_on_clear: bool,

    #[arg(
        long,
        value_name = "FILTER",
        default_value = "warn",
        help = "Log filter used when RUST_LOG is not set"
    )]
    log_level: String,

    #[arg(long, value_name = "PATH", help = "Append logs to this file instead of stderr")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn repl_config(&self) -> ReplConfig {
        ReplConfig {
            prompt: self.prompt.clone(),
            banner: (!self.no_banner).then(|| self.banner.clone()),
            reprompt_on_clear: self.reprompt_on_clear,
        }
    }

    fn host_options(&self) -> HostOptions {
        HostOptions {
            entry: self.entry.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    logging::init(&cli.log_level, cli.log_file.as_deref())?;

    let mut compiler = WasmCompiler::from_file(&cli.module, cli.host_options())
        .with_context(|| format!("failed to load compiler from {}", cli.module.display()))?;

    if let Some(source) = &cli.eval {
        let output = compiler
            .compile(source)
            .map_err(|failure| anyhow::anyhow!(failure.message))?;
        println!("{output}");
        return Ok(());
    }

    let config = cli.repl_config();
    if io::stdin().is_terminal() {
        run_interactive(compiler, config)
    } else {
        run_piped(compiler, config)
    }
}

fn run_interactive(compiler: WasmCompiler, config: ReplConfig) -> Result<()> {
    let _raw = RawModeGuard::enable().context("failed to enable raw mode")?;
    let mut repl = ReplController::new(compiler, CrosstermTerminal::stdout(), config);
    session::run(&mut repl, &mut TerminalKeys)?;
    let (_, mut terminal) = repl.into_parts();
    terminal.write("\r\n")?;
    Ok(())
}

fn run_piped(compiler: WasmCompiler, config: ReplConfig) -> Result<()> {
    let stdin = io::stdin();
    let mut keys = StreamKeys::new(stdin.lock());
    let mut repl = ReplController::new(compiler, StreamTerminal::new(io::stdout()), config);
    session::run(&mut repl, &mut keys)?;
    let (_, mut terminal) = repl.into_parts();
    terminal.write("\r\n")?;
    Ok(())
}
