//! Directory lifecycle and on-disk naming.
//!
//! Output directories are recreated clean on every run; downloads land in a
//! `.part` file that is renamed into place once complete.

use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before the final rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Stem used when a tale name sanitizes to nothing.
const DEFAULT_STEM: &str = "tale";

/// Remove `dir` recursively if it exists. A missing directory is not an error.
pub fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to remove {}", dir.display())),
    }
}

/// Create `dir` (and parents). An existing directory is not an error.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e).with_context(|| format!("failed to create {}", dir.display())),
    }
}

/// Remove-if-exists, then create: leaves an empty `dir`.
pub fn recreate_dir(dir: &Path) -> Result<()> {
    remove_dir_if_exists(dir)?;
    ensure_dir(dir)?;
    tracing::debug!(dir = %dir.display(), "recreated directory");
    Ok(())
}

/// Path for the temp file: appends `.part` to the final path (e.g. `song.mp3` → `song.mp3.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Best-effort removal of a partial download; missing files are ignored.
pub fn discard_partial(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), "could not remove partial file: {}", e);
        }
    }
}

/// Sanitizes a tale name into a file stem safe on Linux.
///
/// - Replaces NUL, `/`, `\` and control characters with `_`
/// - Trims leading/trailing spaces, dots and underscores
/// - Collapses consecutive underscores
/// - Limits length to 250 bytes so an extension still fits NAME_MAX
///
/// Spaces are kept: tale names are human titles.
pub fn sanitize_file_stem(name: &str) -> String {
    const STEM_MAX: usize = 250;

    let mut out = String::with_capacity(name.len());
    let mut prev_underscore = false;
    for c in name.chars() {
        let c = if c == '\0' || c == '/' || c == '\\' || c.is_control() {
            '_'
        } else {
            c
        };
        if c == '_' {
            if !prev_underscore {
                out.push('_');
            }
            prev_underscore = true;
        } else {
            out.push(c);
            prev_underscore = false;
        }
    }

    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.' || c == '_');
    let mut take = trimmed.len().min(STEM_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    let stem = trimmed[..take].trim_end();
    if stem.is_empty() {
        DEFAULT_STEM.to_string()
    } else {
        stem.to_string()
    }
}
