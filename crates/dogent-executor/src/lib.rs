//! Shell command executor for the dogent agent.
//!
//! Provides:
//! - `ShellExecutor` - `CommandExecutor` backed by a system shell
//! - Shell invocation building
//! - Shell detection utilities

pub mod command;
pub mod executor;
pub mod shell;

pub use command::{CommandBuildError, CommandBuilder, CommandParts};
pub use executor::{DEFAULT_COMMAND_TIMEOUT, ShellExecutor};
pub use shell::{current_shell, get_shell_command, resolve_executable_path};
