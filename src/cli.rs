//! CLI argument parsing for the build runner.
//!
//! Running with no subcommand builds the configured document, matching the
//! flag-less legacy script.
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "texpipe",
    version,
    about = "Two-pass LaTeX build with index generation and PDF publishing",
    after_help = "Commands:\n  build   Typeset, index, typeset again, then copy the PDF (default)\n  plan    Print the commands a build would run\n  init    Write a texpipe.json config stub\n\nExamples:\n  texpipe\n  texpipe build --name report --fail-fast\n  texpipe plan --json\n  texpipe init --name thesis"
)]
pub struct RootArgs {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Emit debug logs on stderr (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    Build(BuildArgs),
    Plan(PlanArgs),
    Init(InitArgs),
}

/// Selects the config and the document to operate on.
#[derive(Args, Debug, Default, Clone)]
pub struct SelectArgs {
    /// Config file (default: ./texpipe.json, optional)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Document base name, without extension
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Build directory for intermediate artifacts
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<String>,
}

/// Build command inputs.
#[derive(Parser, Debug, Default, Clone)]
#[command(about = "Run the two-pass build and publish the PDF")]
pub struct BuildArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Stop at the first failed step instead of running the rest
    #[arg(long, conflicts_with = "keep_going")]
    pub fail_fast: bool,

    /// Run every step even after a failure (legacy behavior)
    #[arg(long, conflicts_with = "fail_fast")]
    pub keep_going: bool,

    /// Wait for Enter before exiting when attached to a terminal
    #[arg(long, conflicts_with = "no_pause")]
    pub interactive: bool,

    /// Never wait for Enter, even if the config enables it
    #[arg(long, conflicts_with = "interactive")]
    pub no_pause: bool,

    /// Print the run report as JSON on stdout (tool output goes to stderr)
    #[arg(long)]
    pub json: bool,
}

/// Plan command inputs.
#[derive(Parser, Debug, Clone)]
#[command(about = "Print the commands a build would run, without running them")]
pub struct PlanArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}

/// Init command inputs.
#[derive(Parser, Debug, Clone)]
#[command(about = "Write a texpipe.json config stub")]
pub struct InitArgs {
    /// Config file to write (default: ./texpipe.json)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Document base name recorded in the stub
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Overwrite an existing config
    #[arg(long)]
    pub force: bool,
}
