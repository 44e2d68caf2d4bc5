//! Shared test infrastructure for integration tests.
//!
//! Fake engine and indexer scripts stand in for pdflatex and makeindex. Both
//! append their argv to a call log so tests can check ordering, and produce
//! deterministic artifacts so tests can check what got published.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const FAKE_ENGINE: &str = r#"#!/bin/sh
echo "engine $*" >> "$TEXPIPE_TEST_LOG"
outdir="."
src=""
for arg in "$@"; do
  case "$arg" in
    -output-directory=*) outdir="${arg#-output-directory=}" ;;
    -*) ;;
    *) src="$arg" ;;
  esac
done
if [ ! -f "$src" ]; then
  echo "fake-engine: cannot find $src" >&2
  exit 1
fi
name=$(basename "$src" .tex)
mkdir -p "$outdir"
grep '\\index' "$src" | sed 's/.*\\index{\([^}]*\)}.*/\1/' > "$outdir/$name.idx"
if [ -f "$outdir/$name.ind" ]; then
  { echo "PDF $name"; cat "$src"; echo "INDEX"; cat "$outdir/$name.ind"; } > "$outdir/$name.pdf"
else
  { echo "PDF $name draft"; cat "$src"; } > "$outdir/$name.pdf"
fi
"#;

const FAKE_INDEXER: &str = r#"#!/bin/sh
echo "indexer $*" >> "$TEXPIPE_TEST_LOG"
out=""
in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift 2 ;;
    *) in="$1"; shift ;;
  esac
done
if [ ! -f "$in" ]; then
  echo "fake-indexer: cannot open $in" >&2
  exit 1
fi
sort "$in" | sed 's/^/\\item /' > "$out"
"#;

/// A temporary working directory with fake tools and a texpipe.json.
pub struct TestFixture {
    dir: TempDir,
}

impl TestFixture {
    /// Create a fixture whose config builds `name` with the fake tools.
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let tools = dir.path().join("tools");
        fs::create_dir_all(&tools).expect("create tools dir");
        fs::write(tools.join("fake-engine.sh"), FAKE_ENGINE).expect("write fake engine");
        fs::write(tools.join("fake-indexer.sh"), FAKE_INDEXER).expect("write fake indexer");
        let fixture = Self { dir };
        fixture.write_config(name, "continue");
        fixture
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Rewrite texpipe.json; the tools run through `sh` so they need no exec bit.
    pub fn write_config(&self, name: &str, on_failure: &str) {
        let tools = self.path("tools");
        let config = serde_json::json!({
            "schema_version": 1,
            "name": name,
            "build_dir": "build",
            "engine": format!("sh '{}'", tools.join("fake-engine.sh").display()),
            "indexer": format!("sh '{}'", tools.join("fake-indexer.sh").display()),
            "on_failure": on_failure,
        });
        let text = serde_json::to_string_pretty(&config).expect("serialize config");
        fs::write(self.path("texpipe.json"), text).expect("write config");
    }

    pub fn write_file(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directory");
        }
        fs::write(path, contents).expect("write file");
    }

    pub fn read(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap_or_else(|err| panic!("read {rel}: {err}"))
    }

    /// Tool invocations in the order they happened, as "engine ..." / "indexer ..." lines.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.path("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[allow(dead_code)]
    pub fn clear_calls(&self) {
        let _ = fs::remove_file(self.path("calls.log"));
    }

    /// Run the texpipe binary in the fixture directory.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_texpipe"))
            .args(args)
            .current_dir(self.root())
            .env("TEXPIPE_TEST_LOG", self.path("calls.log"))
            .env_remove("TEXPIPE_ENGINE")
            .env_remove("TEXPIPE_INDEXER")
            .env("RUST_LOG", "texpipe=warn")
            .output()
            .expect("run texpipe")
    }
}

/// Skip unix-shell based tests when `sh` is unavailable.
#[allow(dead_code)]
pub fn shell_available() -> bool {
    which::which("sh").is_ok()
}
