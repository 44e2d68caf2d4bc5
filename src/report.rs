//! Run report and history persistence.
//!
//! The report is a snapshot of the latest run; the history is append-only so
//! earlier runs stay auditable.
use crate::config::{FailurePolicy, PipelineConfig};
use crate::paths::BuildPaths;
use crate::pipeline::{PipelineRun, StepOutcome};
use crate::util::now_epoch_ms;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;

/// Current schema version for the run report and history lines.
pub const REPORT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BuildReport {
    pub schema_version: u32,
    pub generated_at_epoch_ms: u128,
    pub name: String,
    pub build_dir: String,
    pub policy: FailurePolicy,
    pub steps: Vec<StepOutcome>,
    pub published: bool,
    pub exit_code: i32,
}

pub fn build_report(config: &PipelineConfig, run: &PipelineRun) -> Result<BuildReport> {
    Ok(BuildReport {
        schema_version: REPORT_SCHEMA_VERSION,
        generated_at_epoch_ms: now_epoch_ms()?,
        name: config.name.clone(),
        build_dir: config.build_dir.clone(),
        policy: config.on_failure,
        steps: run.outcomes.clone(),
        published: run.published(),
        exit_code: run.exit_code(),
    })
}

/// Write the latest report snapshot to `<build>/<name>.texpipe.json`.
pub fn write_report(paths: &BuildPaths, report: &BuildReport) -> Result<()> {
    let path = paths.report_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create build dir")?;
    }
    let text = serde_json::to_string_pretty(report).context("serialize build report")?;
    fs::write(&path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Append the report as one JSONL line to the build history.
pub fn append_history(paths: &BuildPaths, report: &BuildReport) -> Result<()> {
    let path = paths.history_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create build dir")?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open {}", path.display()))?;
    let line = serde_json::to_string(report).context("serialize build history entry")?;
    file.write_all(line.as_bytes())
        .with_context(|| format!("write {}", path.display()))?;
    file.write_all(b"\n")
        .with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// One line per step for the console.
pub fn render_summary(report: &BuildReport) -> String {
    let mut out = String::new();
    for outcome in &report.steps {
        let status = if outcome.skipped {
            "skipped".to_string()
        } else if outcome.success {
            "ok".to_string()
        } else {
            match outcome.exit_code {
                Some(code) => format!("failed (exit {code})"),
                None => "failed".to_string(),
            }
        };
        out.push_str(&format!("  {:<18} {status}\n", outcome.step.label()));
    }
    out
}
