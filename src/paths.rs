//! Typed paths into a document build layout.
//!
//! Tool arguments use paths relative to the working directory, as the legacy
//! script did; filesystem access goes through the resolved absolute forms.
use std::path::{Path, PathBuf};

/// Extension of the document source.
pub const SOURCE_EXT: &str = "tex";
/// Extension of the raw index data written by the engine.
pub const IDX_EXT: &str = "idx";
/// Extension of the formatted index written by the indexer.
pub const IND_EXT: &str = "ind";
/// Extension of the typeset output.
pub const PDF_EXT: &str = "pdf";

const HISTORY_FILE_NAME: &str = "texpipe-history.jsonl";

/// Convenience wrapper for locating every artifact of one document build.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    work_dir: PathBuf,
    build_dir: PathBuf,
    name: String,
}

impl BuildPaths {
    /// Create a path helper for `name` building into `build_dir` under `work_dir`.
    pub fn new(work_dir: PathBuf, build_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            work_dir,
            build_dir: build_dir.into(),
            name: name.into(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Build directory as passed to tools.
    pub fn build_dir_arg(&self) -> &Path {
        &self.build_dir
    }

    /// Build directory on disk.
    pub fn build_dir(&self) -> PathBuf {
        self.resolve(&self.build_dir)
    }

    /// `<name>.tex` as passed to the engine.
    pub fn source_arg(&self) -> PathBuf {
        PathBuf::from(self.file_name(SOURCE_EXT))
    }

    pub fn source_path(&self) -> PathBuf {
        self.resolve(&self.source_arg())
    }

    /// `<build>/<name>.idx` as passed to the indexer.
    pub fn idx_arg(&self) -> PathBuf {
        self.build_artifact_arg(IDX_EXT)
    }

    /// `<build>/<name>.ind` as passed to the indexer.
    pub fn ind_arg(&self) -> PathBuf {
        self.build_artifact_arg(IND_EXT)
    }

    /// `<build>/<name>.pdf` as shown in plans and reports.
    pub fn build_pdf_arg(&self) -> PathBuf {
        self.build_artifact_arg(PDF_EXT)
    }

    pub fn build_pdf_path(&self) -> PathBuf {
        self.resolve(&self.build_pdf_arg())
    }

    /// `<name>.pdf` in the working directory.
    pub fn published_pdf_arg(&self) -> PathBuf {
        PathBuf::from(self.file_name(PDF_EXT))
    }

    pub fn published_pdf_path(&self) -> PathBuf {
        self.resolve(&self.published_pdf_arg())
    }

    /// `<build>/<name>.texpipe.json`, the latest run report.
    pub fn report_path(&self) -> PathBuf {
        self.build_dir().join(format!("{}.texpipe.json", self.name))
    }

    /// `<build>/texpipe-history.jsonl`, one line per run.
    pub fn history_path(&self) -> PathBuf {
        self.build_dir().join(HISTORY_FILE_NAME)
    }

    fn build_artifact_arg(&self, ext: &str) -> PathBuf {
        self.build_dir.join(self.file_name(ext))
    }

    fn file_name(&self, ext: &str) -> String {
        format!("{}.{ext}", self.name)
    }

    fn resolve(&self, rel: &Path) -> PathBuf {
        self.work_dir.join(rel)
    }
}
