use anyhow::{anyhow, Context, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Copy the built PDF over `dest`, leaving `source` in place.
///
/// The copy lands in a temp file beside `dest` and is renamed over it, so a
/// reader never sees a half-written PDF.
pub fn publish_pdf(source: &Path, dest: &Path) -> Result<u64> {
    if !source.is_file() {
        return Err(anyhow!("build output {} not found", source.display()));
    }
    let dest_dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut input = fs::File::open(source).with_context(|| format!("open {}", source.display()))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".texpipe-")
        .suffix(".pdf.tmp")
        .tempfile_in(dest_dir)
        .with_context(|| format!("stage copy in {}", dest_dir.display()))?;
    let bytes = io::copy(&mut input, staged.as_file_mut())
        .with_context(|| format!("copy {}", source.display()))?;
    let permissions = fs::metadata(source)
        .with_context(|| format!("inspect {}", source.display()))?
        .permissions();
    fs::set_permissions(staged.path(), permissions)
        .with_context(|| format!("set permissions on {}", staged.path().display()))?;
    staged
        .persist(dest)
        .map_err(|err| err.error)
        .with_context(|| format!("publish {}", dest.display()))?;
    Ok(bytes)
}
