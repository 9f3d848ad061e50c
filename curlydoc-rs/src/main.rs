//! cud2html entry point

use std::fs;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;
use curlydoc::cli::Args;
use curlydoc::html::to_html;
use curlydoc::script::{fs_loader, Interpreter};
use curlydoc::tree::write_forest;
use tracing::{debug, info};

/// Stack for the evaluation thread; deep documents recurse once per level.
const EVAL_STACK_SIZE: usize = 64 * 1024 * 1024;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    thread::Builder::new()
        .name("eval".into())
        .stack_size(EVAL_STACK_SIZE)
        .spawn(move || run(args))
        .context("Failed to spawn evaluation thread")?
        .join()
        .map_err(|_| anyhow::anyhow!("evaluation thread panicked"))?
}

fn run(args: Args) -> Result<()> {
    let src = fs::read_to_string(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    let mut interp = Interpreter::with_config(args.config())
        .context("Failed to initialize interpreter")?
        .with_file_loader(fs_loader());
    debug!(input = %args.input.display(), "evaluating");

    // The error's Display carries the whole location trail.
    let forest = interp
        .eval_source(&src)
        .map_err(|e| anyhow::anyhow!("{e}"))?;
    info!(nodes = forest.len(), "evaluated");

    let mut out = if args.dump {
        write_forest(&forest)
    } else {
        to_html(&forest).with_context(|| format!("Failed to render {}", args.input.display()))?
    };
    out.push('\n');

    match &args.output {
        Some(path) => fs::write(path, out)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => print!("{out}"),
    }
    Ok(())
}
