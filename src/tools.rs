//! External tool commands and the invocations built from them.
//!
//! The engine and the indexer are opaque: we only decide their argv and the
//! directory they run in.
use crate::paths::BuildPaths;
use crate::pipeline::Step;
use crate::util::path_to_string;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

/// A configured command string split into program and leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    /// Split a command string such as `pdflatex -interaction=nonstopmode`.
    pub fn parse(command: &str) -> Result<Self> {
        let mut argv =
            shell_words::split(command).with_context(|| format!("parse command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("command is empty"));
        }
        let program = argv.remove(0);
        Ok(Self {
            program,
            args: argv,
        })
    }
}

/// One fully resolved external process for a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub step: Step,
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    /// Shell-quoted rendering for logs, plans, and reports.
    pub fn command_line(&self) -> String {
        let mut words = Vec::with_capacity(self.args.len() + 1);
        words.push(self.program.as_str());
        words.extend(self.args.iter().map(String::as_str));
        shell_words::join(words)
    }
}

/// Typesetting pass: `<engine> -output-directory=<build> <name>.tex`.
pub fn engine_invocation(step: Step, engine: &ToolCommand, paths: &BuildPaths) -> Result<Invocation> {
    let build_dir = path_to_string(paths.build_dir_arg(), "build directory")?;
    let source = path_to_string(&paths.source_arg(), "document source")?;
    let mut args = engine.args.clone();
    args.push(format!("-output-directory={build_dir}"));
    args.push(source);
    Ok(Invocation {
        step,
        program: engine.program.clone(),
        args,
        cwd: paths.work_dir().to_path_buf(),
    })
}

/// Index generation: `<indexer> -o <build>/<name>.ind <build>/<name>.idx`.
pub fn indexer_invocation(indexer: &ToolCommand, paths: &BuildPaths) -> Result<Invocation> {
    let output = path_to_string(&paths.ind_arg(), "index output")?;
    let input = path_to_string(&paths.idx_arg(), "index input")?;
    let mut args = indexer.args.clone();
    args.push("-o".to_string());
    args.push(output);
    args.push(input);
    Ok(Invocation {
        step: Step::Index,
        program: indexer.program.clone(),
        args,
        cwd: paths.work_dir().to_path_buf(),
    })
}

/// Locate a program on PATH; explicit paths are resolved against `cwd`.
pub fn resolve_program(program: &str, cwd: &Path) -> Result<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 || candidate.is_absolute() {
        let path = cwd.join(candidate);
        if !path.is_file() {
            return Err(anyhow!("{} not found", path.display()));
        }
        return Ok(path);
    }
    which::which(program).with_context(|| format!("{program} not found on PATH"))
}
