//! Command-line arguments for `cud2html`.
//!
//! Usage:
//!   cud2html [-o <file>] [--dump] [--max-depth <n>] [--no-stdlib] [-v] <input>

use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, DEFAULT_MAX_DEPTH};

/// Translate a curlydoc document to HTML.
#[derive(Debug, Parser)]
#[command(name = "cud2html")]
#[command(about = "Translate a curlydoc document to HTML")]
#[command(version)]
pub struct Args {
    /// Input document
    pub input: PathBuf,

    /// Write output here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the evaluated document in source syntax instead of HTML
    #[arg(long)]
    pub dump: bool,

    /// Maximum evaluation nesting depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub max_depth: usize,

    /// Do not load the standard library
    #[arg(long)]
    pub no_stdlib: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Interpreter configuration for this run.  The input path is the root
    /// file, so includes resolve relative to it.
    pub fn config(&self) -> Config {
        Config::new()
            .with_max_depth(self.max_depth)
            .with_stdlib(!self.no_stdlib)
            .with_root_file(self.input.to_string_lossy())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
