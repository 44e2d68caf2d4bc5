use super::*;
use anyhow::anyhow;
use std::collections::HashMap;
use std::path::Path;

/// Records invocations and emulates the tools' file effects.
#[derive(Default)]
struct RecordingRunner {
    calls: Vec<Step>,
    exit_codes: HashMap<Step, i32>,
    spawn_failures: Vec<Step>,
}

impl RecordingRunner {
    fn failing(step: Step, code: i32) -> Self {
        let mut runner = Self::default();
        runner.exit_codes.insert(step, code);
        runner
    }
}

impl StepRunner for RecordingRunner {
    fn run(&mut self, invocation: &Invocation) -> Result<ExitSummary> {
        self.calls.push(invocation.step);
        if self.spawn_failures.contains(&invocation.step) {
            return Err(anyhow!("{} not found on PATH", invocation.program));
        }
        let code = self.exit_codes.get(&invocation.step).copied().unwrap_or(0);
        if code == 0 {
            emulate_tool(invocation);
        }
        Ok(ExitSummary::from_code(code))
    }
}

fn emulate_tool(invocation: &Invocation) {
    let cwd = &invocation.cwd;
    match invocation.step {
        Step::Pass1 | Step::Pass2 => {
            let ind = cwd.join("build/doc.ind");
            let body = if ind.is_file() {
                format!("pdf+{}", std::fs::read_to_string(&ind).expect("read ind"))
            } else {
                "pdf-draft".to_string()
            };
            std::fs::write(cwd.join("build/doc.idx"), "entries").expect("write idx");
            std::fs::write(cwd.join("build/doc.pdf"), body).expect("write pdf");
        }
        Step::Index => {
            std::fs::write(cwd.join("build/doc.ind"), "index").expect("write ind");
        }
        Step::Publish => unreachable!("publish runs in-process"),
    }
}

fn pipeline(work_dir: &Path, policy: FailurePolicy) -> BuildPipeline {
    let paths = BuildPaths::new(work_dir.to_path_buf(), "build", "doc");
    BuildPipeline::new(
        paths,
        ToolCommand::parse("pdflatex").expect("engine"),
        ToolCommand::parse("makeindex").expect("indexer"),
        policy,
    )
}

#[test]
fn stages_advance_in_fixed_order() {
    assert_eq!(
        ordered_steps(),
        vec![Step::Pass1, Step::Index, Step::Pass2, Step::Publish]
    );
    assert_eq!(Stage::Done.next(), Stage::Done);
    assert_eq!(Stage::Start.step(), None);
}

#[test]
fn tools_run_typeset_index_typeset() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut runner = RecordingRunner::default();
    let run = pipeline(dir.path(), FailurePolicy::Continue)
        .run(&mut runner)
        .expect("run pipeline");

    assert_eq!(runner.calls, vec![Step::Pass1, Step::Index, Step::Pass2]);
    assert!(run.published());
    assert_eq!(run.exit_code(), 0);
    assert_eq!(
        std::fs::read_to_string(dir.path().join("doc.pdf")).expect("read published"),
        "pdf+index"
    );
}

#[test]
fn continue_policy_runs_every_step_after_failure() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut runner = RecordingRunner::failing(Step::Pass1, 1);
    runner.exit_codes.insert(Step::Index, 1);
    runner.exit_codes.insert(Step::Pass2, 1);
    let run = pipeline(dir.path(), FailurePolicy::Continue)
        .run(&mut runner)
        .expect("run pipeline");

    assert_eq!(runner.calls, vec![Step::Pass1, Step::Index, Step::Pass2]);
    assert_eq!(run.outcomes.len(), 4);
    assert!(run.outcomes.iter().all(|outcome| !outcome.skipped));
    let publish = &run.outcomes[3];
    assert!(!publish.success);
    assert!(publish
        .note
        .as_deref()
        .is_some_and(|note| note.contains("not found")));
    assert_eq!(run.exit_code(), 1);
}

#[test]
fn continue_policy_publishes_stale_build_output() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::create_dir_all(dir.path().join("build")).expect("create build");
    std::fs::write(dir.path().join("build/doc.pdf"), "old build").expect("write old pdf");
    let mut runner = RecordingRunner::failing(Step::Pass2, 1);
    let run = pipeline(dir.path(), FailurePolicy::Continue)
        .run(&mut runner)
        .expect("run pipeline");

    assert!(run.published());
    assert_eq!(run.exit_code(), 0);
}

#[test]
fn stop_policy_skips_remaining_steps() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut runner = RecordingRunner::failing(Step::Index, 3);
    let run = pipeline(dir.path(), FailurePolicy::Stop)
        .run(&mut runner)
        .expect("run pipeline");

    assert_eq!(runner.calls, vec![Step::Pass1, Step::Index]);
    let skipped: Vec<Step> = run
        .outcomes
        .iter()
        .filter(|outcome| outcome.skipped)
        .map(|outcome| outcome.step)
        .collect();
    assert_eq!(skipped, vec![Step::Pass2, Step::Publish]);
    assert!(!run.published());
    assert_eq!(run.exit_code(), 3);
    assert!(!dir.path().join("doc.pdf").exists());
}

#[test]
fn spawn_failure_is_recorded_not_raised() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let mut runner = RecordingRunner {
        spawn_failures: vec![Step::Index],
        ..RecordingRunner::default()
    };
    let run = pipeline(dir.path(), FailurePolicy::Continue)
        .run(&mut runner)
        .expect("run pipeline");

    let index = &run.outcomes[1];
    assert_eq!(index.step, Step::Index);
    assert_eq!(index.exit_code, None);
    assert!(index
        .note
        .as_deref()
        .is_some_and(|note| note.contains("makeindex not found on PATH")));
    assert_eq!(runner.calls.len(), 3);
    assert!(run.published());
}

#[test]
fn stale_published_pdf_is_overwritten() {
    let dir = tempfile::tempdir().expect("create temp dir");
    std::fs::write(dir.path().join("doc.pdf"), "stale").expect("write stale");
    let mut runner = RecordingRunner::default();
    pipeline(dir.path(), FailurePolicy::Continue)
        .run(&mut runner)
        .expect("run pipeline");

    let published = std::fs::read(dir.path().join("doc.pdf")).expect("read published");
    let built = std::fs::read(dir.path().join("build/doc.pdf")).expect("read built");
    assert_eq!(published, built);
}

#[test]
fn plan_lists_commands_without_running() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let plan = pipeline(dir.path(), FailurePolicy::Continue)
        .plan()
        .expect("plan");
    let lines: Vec<&str> = plan.iter().map(|step| step.command_line.as_str()).collect();
    assert_eq!(
        lines,
        vec![
            "pdflatex -output-directory=build doc.tex",
            "makeindex -o build/doc.ind build/doc.idx",
            "pdflatex -output-directory=build doc.tex",
            "copy build/doc.pdf doc.pdf",
        ]
    );
    assert!(!dir.path().join("build").exists());
}
