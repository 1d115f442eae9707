//! Command-line and environment configuration.

use std::time::Duration;

use clap::{Parser, ValueEnum};
use dogent_core::SessionConfig;
use dogent_executor::ShellExecutor;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Persistent remote-control agent.
#[derive(Debug, Parser)]
#[command(name = "dogent-agent", version, about)]
pub struct Cli {
    /// Control server WebSocket URL.
    #[arg(long, env = "DOGENT_SERVER_URL")]
    pub server_url: String,

    /// Authentication token.
    #[arg(long, env = "DOGENT_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Identifier announced to the server.
    #[arg(long, env = "DOGENT_SERVER_ID")]
    pub server_id: String,

    /// Seconds to wait between failed connection attempts.
    #[arg(long, env = "DOGENT_RECONNECT_DELAY_SECS", default_value_t = 5)]
    pub reconnect_delay_secs: u64,

    /// Shell command line used to run commands, e.g. "bash -lc".
    #[arg(long, env = "DOGENT_SHELL")]
    pub shell: Option<String>,

    /// Per-command timeout in seconds (0 disables).
    #[arg(long, env = "DOGENT_COMMAND_TIMEOUT_SECS", default_value_t = 300)]
    pub command_timeout_secs: u64,

    /// Log output format.
    #[arg(long, env = "DOGENT_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Cli {
    /// Session configuration from the parsed flags.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::new(&self.server_url, &self.token, &self.server_id)
            .with_reconnect_delay(Duration::from_secs(self.reconnect_delay_secs))
    }

    /// Command executor from the parsed flags.
    #[must_use]
    pub fn executor(&self) -> ShellExecutor {
        let timeout = (self.command_timeout_secs > 0)
            .then(|| Duration::from_secs(self.command_timeout_secs));
        let executor = ShellExecutor::new().with_timeout(timeout);
        match &self.shell {
            Some(shell) => executor.with_shell(shell.as_str()),
            None => executor,
        }
    }
}
