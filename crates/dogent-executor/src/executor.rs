//! Shell-backed command executor.

use std::{io::Read, process::Stdio, time::Duration};

use async_trait::async_trait;
use command_group::AsyncCommandGroup;
use dogent_core::{CommandExecutor, ExecutionError};

use crate::command::CommandBuilder;

/// Default limit on a single command's run time.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs each command string through a shell and captures its output.
///
/// The child is spawned in its own process group so a timeout takes down
/// everything the command started, not just the shell.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    builder: CommandBuilder,
    timeout: Option<Duration>,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellExecutor {
    /// Executor using the detected shell and the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            builder: CommandBuilder::default(),
            timeout: Some(DEFAULT_COMMAND_TIMEOUT),
        }
    }

    /// Use an explicit shell command line, e.g. `bash -lc`.
    #[must_use]
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.builder = CommandBuilder::new(shell);
        self
    }

    /// Set the per-command timeout. `None` waits forever.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The shell command line commands are run through.
    #[must_use]
    pub fn shell(&self) -> &str {
        &self.builder.base
    }
}

#[async_trait]
impl CommandExecutor for ShellExecutor {
    async fn execute(&self, command: &str) -> Result<String, ExecutionError> {
        if command.trim().is_empty() {
            return Err(ExecutionError::EmptyCommand);
        }

        let (program, args) = self
            .builder
            .build(command)
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?
            .into_resolved()
            .await
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        // stdout and stderr share one pipe so the output keeps its real order.
        let (mut reader, writer) = std::io::pipe()?;

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer)
            .kill_on_drop(true);

        tracing::debug!(command, shell = %program.display(), "Spawning command");

        let spawned = cmd.group_spawn();
        // The parent's copies of the write end must close or the reader never sees EOF.
        drop(cmd);
        let mut child = spawned.map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        let mut output_task = tokio::task::spawn_blocking(move || {
            let mut buf = Vec::new();
            if let Err(e) = reader.read_to_end(&mut buf) {
                tracing::debug!("Output pipe read ended early: {e}");
            }
            buf
        });

        // The deadline covers draining the pipe too: a background job that
        // inherited it keeps it open after the shell itself exits.
        let finished = async {
            let status = child.wait().await?;
            let output = (&mut output_task).await.unwrap_or_default();
            Ok::<_, std::io::Error>((status, output))
        };

        let (status, output) = match self.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, finished).await;
                if let Ok(finished) = waited {
                    finished?
                } else {
                    if let Err(e) = child.kill().await {
                        tracing::warn!("Failed to kill timed out command: {e}");
                    }
                    output_task.abort();
                    tracing::warn!(command, ?limit, "Command timed out");
                    return Err(ExecutionError::TimedOut(limit));
                }
            }
            None => finished.await?,
        };

        let output = String::from_utf8_lossy(&output).into_owned();

        tracing::debug!(command, %status, bytes = output.len(), "Command finished");

        if status.success() {
            Ok(output)
        } else {
            Err(ExecutionError::Failed {
                status: status.to_string(),
                output,
            })
        }
    }
}
