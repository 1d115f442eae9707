//! Shell detection and executable resolution.

use std::path::{Path, PathBuf};

/// Returns the shell program and its "run this string" flag.
///
/// - Windows: `("cmd", "/C")`
/// - Unix-like: the `$SHELL` program with `-c`, falling back to `/bin/sh`
#[must_use]
pub fn get_shell_command() -> (String, &'static str) {
    if cfg!(windows) {
        ("cmd".into(), "/C")
    } else {
        (current_shell().to_string_lossy().into_owned(), "-c")
    }
}

/// Resolve an executable by name.
///
/// Absolute paths are taken as-is when they exist; anything else is looked
/// up on `PATH`.
pub async fn resolve_executable_path(executable: &str) -> Option<PathBuf> {
    if executable.trim().is_empty() {
        return None;
    }

    let path = Path::new(executable);
    if path.is_absolute() && path.is_file() {
        return Some(path.to_path_buf());
    }

    let executable = executable.to_string();
    tokio::task::spawn_blocking(move || which::which(executable))
        .await
        .ok()
        .and_then(Result::ok)
}

/// The user's login shell from `$SHELL`, or `/bin/sh`.
#[must_use]
pub fn current_shell() -> PathBuf {
    std::env::var_os("SHELL")
        .and_then(|shell| usable_shell(Path::new(&shell)))
        .unwrap_or_else(|| PathBuf::from("/bin/sh"))
}

/// A shell path is usable when it is absolute and exists.
fn usable_shell(path: &Path) -> Option<PathBuf> {
    (path.is_absolute() && path.is_file()).then(|| path.to_path_buf())
}
