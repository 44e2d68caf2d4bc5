//! Process execution for pipeline steps.
use crate::tools::{resolve_program, Invocation};
use anyhow::{Context, Result};
use std::io;
use std::process::{Command, ExitStatus, Stdio};

/// Exit information for a finished step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitSummary {
    pub code: Option<i32>,
    pub success: bool,
}

impl ExitSummary {
    #[cfg(test)]
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }
}

impl From<ExitStatus> for ExitSummary {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}

/// Runs one invocation to completion.
///
/// Implementations must not return before the process has exited; the
/// pipeline relies on this to keep steps from overlapping.
pub trait StepRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ExitSummary>;
}

/// Spawns real processes with inherited stdio so tool output reaches the console.
#[derive(Debug, Default)]
pub struct ProcessRunner {
    stdout_to_stderr: bool,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send tool stdout to our stderr, keeping stdout free for JSON output.
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }
}

impl StepRunner for ProcessRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ExitSummary> {
        let program = resolve_program(&invocation.program, &invocation.cwd)?;
        tracing::debug!(
            step = invocation.step.as_str(),
            program = %program.display(),
            "spawning"
        );
        let mut command = Command::new(&program);
        command.args(&invocation.args).current_dir(&invocation.cwd);
        if self.stdout_to_stderr {
            command.stdout(Stdio::from(io::stderr()));
        }
        let status = command
            .status()
            .with_context(|| format!("run {}", invocation.command_line()))?;
        Ok(ExitSummary::from(status))
    }
}
