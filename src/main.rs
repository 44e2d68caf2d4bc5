use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

mod cli;
mod config;
mod console;
mod paths;
mod pipeline;
mod report;
mod tools;
mod util;
mod workflow;

use cli::{BuildArgs, Command, RootArgs};

fn main() -> Result<ExitCode> {
    let args = RootArgs::parse();
    init_tracing(args.verbose);

    let code = match args.command {
        Some(Command::Build(build)) => workflow::run_build(build)?,
        None => workflow::run_build(BuildArgs::default())?,
        Some(Command::Plan(plan)) => {
            workflow::run_plan(plan)?;
            0
        }
        Some(Command::Init(init)) => {
            workflow::run_init(init)?;
            0
        }
    };
    Ok(ExitCode::from(u8::try_from(code).unwrap_or(1)))
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if verbose { "texpipe=debug" } else { "texpipe=info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
