//! Locates the Python interpreter used to run the rendered template.

use std::path::PathBuf;

use crate::error::LauncherError;

/// Find a usable `python3` (falling back to `python`) on `PATH`.
///
/// Mirrors `other_examples`' `which`-based discovery, with the same
/// no-console-window normalization the original sandbox applies on Windows:
/// a `pythonw.exe` resolution (no stdout/stderr pipes attach correctly to a
/// windowless build) is rewritten to its `python.exe` sibling.
pub fn discover() -> Result<PathBuf, LauncherError> {
    let found = which::which("python3")
        .or_else(|_| which::which("python"))
        .map_err(|_| LauncherError::InterpreterNotFound)?;

    Ok(normalize_windowless(found))
}

fn normalize_windowless(path: PathBuf) -> PathBuf {
    let is_pythonw = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.eq_ignore_ascii_case("pythonw.exe"))
        .unwrap_or(false);
    if !is_pythonw {
        return path;
    }
    path.with_file_name("python.exe")
}
