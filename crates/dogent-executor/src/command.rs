//! Shell invocation building.

use std::path::PathBuf;

use thiserror::Error;

use crate::shell::{get_shell_command, resolve_executable_path};

/// Command build error.
#[derive(Debug, Error)]
pub enum CommandBuildError {
    #[error("Shell command cannot be parsed: {0}")]
    InvalidBase(String),
    #[error("Shell command is empty after parsing")]
    EmptyCommand,
    #[error("Executable not found: {0}")]
    NotFound(String),
}

/// Parsed command parts (program + args).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParts {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandParts {
    /// Create new command parts.
    #[must_use]
    pub const fn new(program: String, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Resolve the program to an absolute path.
    ///
    /// # Errors
    /// Returns error if executable not found.
    pub async fn into_resolved(self) -> Result<(PathBuf, Vec<String>), CommandBuildError> {
        let Self { program, args } = self;
        let executable = resolve_executable_path(&program)
            .await
            .ok_or_else(|| CommandBuildError::NotFound(program.clone()))?;
        Ok((executable, args))
    }
}

/// Builds `<shell> <flag> <command text>` invocations.
///
/// The base is a shell command line such as `sh -c` or `bash -lc`; the
/// command text received from the server is appended as one argument.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    /// Shell program plus its leading flags.
    pub base: String,
}

impl Default for CommandBuilder {
    fn default() -> Self {
        let (shell, flag) = get_shell_command();
        let base = shlex::try_quote(&shell)
            .map_or_else(|_| format!("{shell} {flag}"), |quoted| format!("{quoted} {flag}"));
        Self { base }
    }
}

impl CommandBuilder {
    /// Create a builder from an explicit shell command line.
    #[must_use]
    pub fn new<S: Into<String>>(base: S) -> Self {
        Self { base: base.into() }
    }

    /// Build the invocation for `command`.
    ///
    /// # Errors
    /// Returns error if the shell command line is invalid.
    pub fn build(&self, command: &str) -> Result<CommandParts, CommandBuildError> {
        let mut parts = split_command_line(&self.base)?;
        if parts.is_empty() {
            return Err(CommandBuildError::EmptyCommand);
        }
        parts.push(command.to_string());

        let program = parts.remove(0);
        Ok(CommandParts::new(program, parts))
    }
}

fn split_command_line(input: &str) -> Result<Vec<String>, CommandBuildError> {
    #[cfg(windows)]
    {
        let parts = winsplit::split(input);
        if parts.is_empty() {
            Err(CommandBuildError::EmptyCommand)
        } else {
            Ok(parts)
        }
    }

    #[cfg(not(windows))]
    {
        shlex::split(input).ok_or_else(|| CommandBuildError::InvalidBase(input.to_string()))
    }
}
