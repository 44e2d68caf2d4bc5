//! The two-pass build pipeline.
//!
//! Four steps run in a fixed order: typeset, index, typeset, publish. Each
//! process exits before the next one starts. Tool failures are recorded as
//! step outcomes rather than errors; the failure policy decides whether later
//! steps still run.
mod publish;
mod runner;
mod step;

pub use publish::publish_pdf;
pub use runner::{ExitSummary, ProcessRunner, StepRunner};
pub use step::{ordered_steps, Stage, Step};

use crate::config::{FailurePolicy, PipelineConfig};
use crate::paths::BuildPaths;
use crate::tools::{engine_invocation, indexer_invocation, Invocation, ToolCommand};
use crate::util::display_path;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Instant;

/// Result of one step.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub step: Step,
    pub command_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    pub success: bool,
    pub skipped: bool,
    pub duration_ms: u128,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StepOutcome {
    fn skipped(step: Step, command_line: String) -> Self {
        Self {
            step,
            command_line,
            exit_code: None,
            success: false,
            skipped: true,
            duration_ms: 0,
            note: Some("skipped after an earlier failure".to_string()),
        }
    }

    /// Exit code this outcome contributes to the process exit status.
    pub fn effective_exit_code(&self) -> i32 {
        if self.success {
            return 0;
        }
        self.exit_code.filter(|code| *code != 0).unwrap_or(1)
    }
}

/// What a step will do, without running it.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct PlannedStep {
    pub step: Step,
    pub command_line: String,
}

/// Outcomes of a complete pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub outcomes: Vec<StepOutcome>,
}

impl PipelineRun {
    /// True when the publish step copied a PDF.
    pub fn published(&self) -> bool {
        self.outcomes
            .iter()
            .any(|outcome| outcome.step == Step::Publish && outcome.success)
    }

    /// Exit code of the last step that actually ran.
    ///
    /// Under `continue` that is always publish; under `stop` it is the step
    /// that failed.
    pub fn exit_code(&self) -> i32 {
        self.outcomes
            .iter()
            .rev()
            .find(|outcome| !outcome.skipped)
            .map(StepOutcome::effective_exit_code)
            .unwrap_or(0)
    }
}

/// The build pipeline for one document.
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    paths: BuildPaths,
    engine: ToolCommand,
    indexer: ToolCommand,
    policy: FailurePolicy,
}

impl BuildPipeline {
    pub fn new(
        paths: BuildPaths,
        engine: ToolCommand,
        indexer: ToolCommand,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            paths,
            engine,
            indexer,
            policy,
        }
    }

    /// Build a pipeline from a validated config rooted at `paths`.
    pub fn from_config(config: &PipelineConfig, paths: BuildPaths) -> Result<Self> {
        let engine = ToolCommand::parse(&config.engine).context("engine command")?;
        let indexer = ToolCommand::parse(&config.indexer).context("indexer command")?;
        Ok(Self::new(paths, engine, indexer, config.on_failure))
    }

    pub fn paths(&self) -> &BuildPaths {
        &self.paths
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// The external process for `step`; `None` for publish, which runs in-process.
    pub fn invocation(&self, step: Step) -> Result<Option<Invocation>> {
        let invocation = match step {
            Step::Pass1 | Step::Pass2 => engine_invocation(step, &self.engine, &self.paths)?,
            Step::Index => indexer_invocation(&self.indexer, &self.paths)?,
            Step::Publish => return Ok(None),
        };
        Ok(Some(invocation))
    }

    /// Resolve every step's command line in execution order.
    pub fn plan(&self) -> Result<Vec<PlannedStep>> {
        ordered_steps()
            .into_iter()
            .map(|step| {
                Ok(PlannedStep {
                    step,
                    command_line: self.command_line(step)?,
                })
            })
            .collect()
    }

    /// Run all steps in order with `runner` executing the external tools.
    pub fn run(&self, runner: &mut dyn StepRunner) -> Result<PipelineRun> {
        let build_dir = self.paths.build_dir();
        fs::create_dir_all(&build_dir)
            .with_context(|| format!("create build dir {}", build_dir.display()))?;

        let mut outcomes = Vec::new();
        let mut halted = false;
        let mut stage = Stage::Start;
        loop {
            stage = stage.next();
            let Some(step) = stage.step() else {
                break;
            };
            if halted {
                outcomes.push(StepOutcome::skipped(step, self.command_line(step)?));
                continue;
            }

            let start = Instant::now();
            let mut outcome = match step {
                Step::Publish => self.publish_step(),
                _ => self.process_step(step, runner)?,
            };
            outcome.duration_ms = start.elapsed().as_millis();

            tracing::info!(
                step = step.as_str(),
                elapsed_ms = outcome.duration_ms,
                exit_code = ?outcome.exit_code,
                success = outcome.success,
                "step complete"
            );
            if !outcome.success {
                if let Some(note) = &outcome.note {
                    tracing::warn!(step = step.as_str(), "{note}");
                }
                if self.policy == FailurePolicy::Stop {
                    tracing::warn!(step = step.as_str(), "stopping after failed step");
                    halted = true;
                }
            }
            outcomes.push(outcome);
        }
        Ok(PipelineRun { outcomes })
    }

    fn process_step(&self, step: Step, runner: &mut dyn StepRunner) -> Result<StepOutcome> {
        let invocation = self
            .invocation(step)?
            .with_context(|| format!("{step} has no external command"))?;
        let command_line = invocation.command_line();
        tracing::debug!(step = step.as_str(), %command_line, "starting step");
        let outcome = match runner.run(&invocation) {
            Ok(exit) => StepOutcome {
                step,
                command_line,
                exit_code: exit.code,
                success: exit.success,
                skipped: false,
                duration_ms: 0,
                note: None,
            },
            Err(err) => StepOutcome {
                step,
                command_line,
                exit_code: None,
                success: false,
                skipped: false,
                duration_ms: 0,
                note: Some(format!("{err:#}")),
            },
        };
        Ok(outcome)
    }

    fn publish_step(&self) -> StepOutcome {
        let source = self.paths.build_pdf_path();
        let dest = self.paths.published_pdf_path();
        let (success, note) = match publish_pdf(&source, &dest) {
            Ok(bytes) => {
                tracing::debug!(bytes, dest = %dest.display(), "published pdf");
                (true, None)
            }
            Err(err) => (false, Some(format!("{err:#}"))),
        };
        StepOutcome {
            step: Step::Publish,
            command_line: self.publish_command_line(),
            exit_code: None,
            success,
            skipped: false,
            duration_ms: 0,
            note,
        }
    }

    fn command_line(&self, step: Step) -> Result<String> {
        Ok(match self.invocation(step)? {
            Some(invocation) => invocation.command_line(),
            None => self.publish_command_line(),
        })
    }

    fn publish_command_line(&self) -> String {
        let work_dir = self.paths.work_dir();
        let source = display_path(&self.paths.build_pdf_path(), Some(work_dir));
        let dest = display_path(&self.paths.published_pdf_path(), Some(work_dir));
        shell_words::join(["copy", source.as_str(), dest.as_str()])
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
