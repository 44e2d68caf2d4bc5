use crate::cli::{BuildArgs, InitArgs, PlanArgs, SelectArgs};
use crate::config::{
    apply_cli_overrides, apply_env_overrides, default_config, load_config_optional, stub_config,
    write_config, ConfigOverrides, FailurePolicy, PipelineConfig, CONFIG_FILE_NAME,
};
use crate::console::pause_for_acknowledgment;
use crate::paths::BuildPaths;
use crate::pipeline::{BuildPipeline, ProcessRunner};
use crate::report::{append_history, build_report, render_summary, write_report};
use anyhow::{anyhow, Context, Result};
use serde::Serialize;
use std::env;
use std::path::{Path, PathBuf};

/// Config, pipeline, and working directory resolved for one command.
struct PipelineContext {
    config: PipelineConfig,
    pipeline: BuildPipeline,
}

impl PipelineContext {
    fn load(select: &SelectArgs, overrides: ConfigOverrides) -> Result<Self> {
        let work_dir = env::current_dir().context("resolve working directory")?;
        let config_path = config_path(&work_dir, select.config.as_deref());
        let mut config = match load_config_optional(&config_path)? {
            Some(config) => config,
            None if select.config.is_some() => {
                return Err(anyhow!("config {} not found", config_path.display()));
            }
            None => {
                tracing::debug!(path = %config_path.display(), "no config file; using defaults");
                default_config()
            }
        };
        apply_env_overrides(&mut config);
        let overrides = ConfigOverrides {
            name: select.name.clone(),
            build_dir: select.build_dir.clone(),
            ..overrides
        };
        apply_cli_overrides(&mut config, &overrides)?;

        let paths = BuildPaths::new(work_dir, config.build_dir.as_str(), config.name.as_str());
        let pipeline = BuildPipeline::from_config(&config, paths)?;
        Ok(Self { config, pipeline })
    }
}

fn config_path(work_dir: &Path, explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => work_dir.join(path),
        None => work_dir.join(CONFIG_FILE_NAME),
    }
}

/// Run the four-step build; returns the process exit code.
pub fn run_build(args: BuildArgs) -> Result<i32> {
    let overrides = ConfigOverrides {
        on_failure: if args.fail_fast {
            Some(FailurePolicy::Stop)
        } else if args.keep_going {
            Some(FailurePolicy::Continue)
        } else {
            None
        },
        interactive: if args.interactive {
            Some(true)
        } else if args.no_pause {
            Some(false)
        } else {
            None
        },
        ..ConfigOverrides::default()
    };
    let ctx = PipelineContext::load(&args.select, overrides)?;
    let paths = ctx.pipeline.paths();
    if !paths.source_path().is_file() {
        tracing::warn!(
            source = %paths.source_path().display(),
            "document source not found; running anyway"
        );
    }

    let announcement = format!("Building {}.pdf", paths.name());
    if args.json {
        eprintln!("{announcement}");
    } else {
        println!("{announcement}");
    }

    let mut runner = ProcessRunner::new().with_stdout_to_stderr(args.json);
    let run = ctx.pipeline.run(&mut runner)?;
    let report = build_report(&ctx.config, &run)?;
    write_report(paths, &report)?;
    append_history(paths, &report)?;

    if args.json {
        let text = serde_json::to_string_pretty(&report).context("serialize build report")?;
        println!("{text}");
    } else {
        print!("{}", render_summary(&report));
        if report.published {
            println!("Published {}", paths.published_pdf_arg().display());
        }
    }

    pause_for_acknowledgment(ctx.config.interactive)?;
    Ok(report.exit_code)
}

#[derive(Serialize)]
struct PlanOutput<'a> {
    name: &'a str,
    build_dir: &'a str,
    policy: FailurePolicy,
    steps: Vec<crate::pipeline::PlannedStep>,
}

/// Print the resolved commands without running anything.
pub fn run_plan(args: PlanArgs) -> Result<()> {
    let ctx = PipelineContext::load(&args.select, ConfigOverrides::default())?;
    let steps = ctx.pipeline.plan()?;
    if args.json {
        let output = PlanOutput {
            name: &ctx.config.name,
            build_dir: &ctx.config.build_dir,
            policy: ctx.pipeline.policy(),
            steps,
        };
        let text = serde_json::to_string_pretty(&output).context("serialize plan")?;
        println!("{text}");
        return Ok(());
    }
    for (idx, planned) in steps.iter().enumerate() {
        println!("{}. {}: {}", idx + 1, planned.step.label(), planned.command_line);
    }
    Ok(())
}

/// Write a config stub, refusing to clobber an existing file without `--force`.
pub fn run_init(args: InitArgs) -> Result<()> {
    let work_dir = env::current_dir().context("resolve working directory")?;
    let path = config_path(&work_dir, args.config.as_deref());
    if path.is_file() && !args.force {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            path.display()
        ));
    }
    let config = stub_config(args.name.as_deref())?;
    write_config(&path, &config)?;
    println!("wrote {}", path.display());
    Ok(())
}
