//! Collaborator traits for transports and command execution.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// One raw inbound frame as received from the transport.
pub type Frame = Vec<u8>;

/// Configuration error. The only fatal condition in the agent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid server URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Unsupported URL scheme {0:?} (expected ws or wss)")]
    UnsupportedScheme(String),
    #[error("Server URL has no host: {0}")]
    MissingHost(String),
}

/// Transport error. Always retryable.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connect failed: {0}")]
    Connect(String),
    #[error("Send failed: {0}")]
    Send(String),
    #[error("Receive failed: {0}")]
    Receive(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Connection closed")]
    Closed,
}

/// Command execution error.
///
/// Never escapes the protocol layer; it is rendered into the
/// `command_result` payload.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Empty command")]
    EmptyCommand,
    #[error("Spawn failed: {0}")]
    Spawn(String),
    #[error("Command failed ({status}): {output}")]
    Failed { status: String, output: String },
    #[error("Command timed out after {0:?}")]
    TimedOut(Duration),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An open, message-framed, bidirectional connection.
#[async_trait]
pub trait Transport: Send {
    /// Send one text frame.
    async fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Block until the next data frame arrives.
    ///
    /// Returns [`TransportError::Closed`] once the peer has gone away.
    async fn recv(&mut self) -> Result<Frame, TransportError>;

    /// Close the connection. Calling this more than once is harmless.
    async fn close(&mut self);
}

/// Dials new transports.
#[async_trait]
pub trait Connector: Send + Sync {
    type Transport: Transport;

    /// Open a transport to `endpoint`.
    async fn connect(&self, endpoint: &Url) -> Result<Self::Transport, TransportError>;
}

/// External command-execution facility.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` and return its captured output.
    async fn execute(&self, command: &str) -> Result<String, ExecutionError>;
}

#[async_trait]
impl<E: CommandExecutor + ?Sized> CommandExecutor for Arc<E> {
    async fn execute(&self, command: &str) -> Result<String, ExecutionError> {
        (**self).execute(command).await
    }
}
