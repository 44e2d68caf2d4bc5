//! Pipeline configuration helpers.
//!
//! Settings live in `texpipe.json` next to the document. A missing file means
//! defaults, so a bare checkout builds `main.tex` exactly like the legacy
//! batch script did.
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Current schema version for `texpipe.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;
/// Config file looked up in the working directory when `--config` is absent.
pub const CONFIG_FILE_NAME: &str = "texpipe.json";
/// Environment variable replacing the typesetting command.
pub const ENGINE_ENV: &str = "TEXPIPE_ENGINE";
/// Environment variable replacing the index command.
pub const INDEXER_ENV: &str = "TEXPIPE_INDEXER";

const DEFAULT_NAME: &str = "main";
const DEFAULT_BUILD_DIR: &str = "build";
const DEFAULT_ENGINE: &str = "pdflatex";
const DEFAULT_INDEXER: &str = "makeindex";

/// What the pipeline does after a step fails.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Run every remaining step anyway (legacy behavior).
    #[default]
    Continue,
    /// Skip every step after the first failure.
    Stop,
}

impl FailurePolicy {
    /// Return the stable string identifier used in JSON artifacts.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::Continue => "continue",
            FailurePolicy::Stop => "stop",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contents of `texpipe.json`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Document base name shared by the source and every derived artifact.
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_build_dir")]
    pub build_dir: String,
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_indexer")]
    pub indexer: String,
    #[serde(default)]
    pub on_failure: FailurePolicy,
    #[serde(default)]
    pub interactive: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        default_config()
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub name: Option<String>,
    pub build_dir: Option<String>,
    pub on_failure: Option<FailurePolicy>,
    pub interactive: Option<bool>,
}

fn default_schema_version() -> u32 {
    CONFIG_SCHEMA_VERSION
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_build_dir() -> String {
    DEFAULT_BUILD_DIR.to_string()
}

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

fn default_indexer() -> String {
    DEFAULT_INDEXER.to_string()
}

/// Build the default config: `main.tex`, `build/`, pdflatex + makeindex.
pub fn default_config() -> PipelineConfig {
    PipelineConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        name: default_name(),
        build_dir: default_build_dir(),
        engine: default_engine(),
        indexer: default_indexer(),
        on_failure: FailurePolicy::default(),
        interactive: false,
    }
}

/// Default config for `init`, optionally naming the document.
pub fn stub_config(name: Option<&str>) -> Result<PipelineConfig> {
    let mut config = default_config();
    if let Some(name) = name {
        config.name = name.to_string();
    }
    validate_config(&config)?;
    Ok(config)
}

/// Load and validate a config file.
pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: PipelineConfig = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse config JSON {}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Load a config file if present; `None` when the file does not exist.
pub fn load_config_optional(path: &Path) -> Result<Option<PipelineConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    load_config(path).map(Some)
}

/// Persist a config to disk in a stable JSON format.
pub fn write_config(path: &Path, config: &PipelineConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

/// Validate schema version, base name, build dir, and tool commands.
pub fn validate_config(config: &PipelineConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported config schema_version {}",
            config.schema_version
        ));
    }
    validate_name(&config.name)?;
    if config.build_dir.trim().is_empty() {
        return Err(anyhow!("build_dir must not be empty"));
    }
    for (label, command) in [("engine", &config.engine), ("indexer", &config.indexer)] {
        let argv = shell_words::split(command)
            .with_context(|| format!("parse {label} command: {command}"))?;
        if argv.is_empty() {
            return Err(anyhow!("{label} command is empty"));
        }
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(anyhow!("document name must not be empty"));
    }
    if name != name.trim() {
        return Err(anyhow!("document name {name:?} has surrounding whitespace"));
    }
    if name.contains(['/', '\\']) {
        return Err(anyhow!(
            "document name {name:?} must be a base name, not a path"
        ));
    }
    if name == "." || name == ".." {
        return Err(anyhow!("document name {name:?} is not a file name"));
    }
    if name.ends_with(".tex") {
        return Err(anyhow!(
            "document name {name:?} includes the .tex extension; use {:?}",
            name.trim_end_matches(".tex")
        ));
    }
    Ok(())
}

/// Replace tool commands from `TEXPIPE_ENGINE` / `TEXPIPE_INDEXER`.
pub fn apply_env_overrides(config: &mut PipelineConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from<F>(config: &mut PipelineConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(engine) = lookup(ENGINE_ENV).filter(|value| !value.trim().is_empty()) {
        config.engine = engine;
    }
    if let Some(indexer) = lookup(INDEXER_ENV).filter(|value| !value.trim().is_empty()) {
        config.indexer = indexer;
    }
}

/// Apply command-line overrides, then re-validate.
pub fn apply_cli_overrides(config: &mut PipelineConfig, overrides: &ConfigOverrides) -> Result<()> {
    if let Some(name) = &overrides.name {
        config.name = name.clone();
    }
    if let Some(build_dir) = &overrides.build_dir {
        config.build_dir = build_dir.clone();
    }
    if let Some(policy) = overrides.on_failure {
        config.on_failure = policy;
    }
    if let Some(interactive) = overrides.interactive {
        config.interactive = interactive;
    }
    validate_config(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
