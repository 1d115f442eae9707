//! Protocol handler: handshake, receive loop and command dispatch.

use dogent_core::{CommandExecutor, SessionConfig, Transport, TransportError};
use dogent_transport::{InboundMessage, OutboundMessage};
use tokio_util::sync::CancellationToken;

/// Why [`ProtocolHandler::serve`] stopped.
#[derive(Debug)]
pub enum ServeExit {
    /// The transport could not deliver another frame.
    ReadFailed(TransportError),
    /// A command result could not be written back.
    ReplyFailed(TransportError),
    /// Shutdown was requested while waiting for a frame.
    Cancelled,
}

/// Drives the wire-level conversation on a borrowed transport.
///
/// Frames are handled strictly one after another: a command's result is
/// written before the next frame is read, so at most one command is ever
/// in flight.
#[derive(Debug, Clone)]
pub struct ProtocolHandler<E> {
    executor: E,
}

impl<E: CommandExecutor> ProtocolHandler<E> {
    /// Create a handler that runs commands through `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self { executor }
    }

    /// Send the handshake frame.
    ///
    /// No reply is awaited; the server signals rejection by closing the
    /// connection.
    ///
    /// # Errors
    /// Returns error if the frame cannot be written.
    pub async fn authenticate<T>(
        &self,
        transport: &mut T,
        config: &SessionConfig,
    ) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        let auth = OutboundMessage::auth(config.token.as_str(), config.server_id.as_str());
        self.send(transport, &auth).await
    }

    /// Encode and send one outbound message.
    ///
    /// # Errors
    /// Returns error if encoding or the write fails.
    pub async fn send<T>(&self, transport: &mut T, msg: &OutboundMessage) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        let frame = msg
            .encode()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        transport.send(frame).await
    }

    /// Read and dispatch frames until the transport is no longer usable.
    ///
    /// Undecodable frames are logged and skipped. `shutdown` is only
    /// observed while waiting for the next frame; a running command is
    /// always allowed to finish and reply.
    pub async fn serve<T>(&self, transport: &mut T, shutdown: &CancellationToken) -> ServeExit
    where
        T: Transport + ?Sized,
    {
        loop {
            let frame = tokio::select! {
                biased;
                () = shutdown.cancelled() => return ServeExit::Cancelled,
                received = transport.recv() => match received {
                    Ok(frame) => frame,
                    Err(e) => {
                        tracing::info!("Read error: {e}");
                        return ServeExit::ReadFailed(e);
                    }
                },
            };

            let message = match InboundMessage::decode(&frame) {
                Ok(message) => message,
                Err(e) => {
                    tracing::warn!(bytes = frame.len(), "Skipping undecodable frame: {e}");
                    continue;
                }
            };

            if let Err(e) = self.dispatch(transport, message).await {
                tracing::warn!("Failed to send command result: {e}");
                return ServeExit::ReplyFailed(e);
            }
        }
    }

    /// Act on one decoded message.
    ///
    /// Only `command` produces a reply; its execution failure is folded into
    /// the reply text rather than returned.
    ///
    /// # Errors
    /// Returns error only if a command result cannot be written.
    pub async fn dispatch<T>(
        &self,
        transport: &mut T,
        message: InboundMessage,
    ) -> Result<(), TransportError>
    where
        T: Transport + ?Sized,
    {
        match &message {
            InboundMessage::Status { content } => {
                tracing::info!(%content, "Server status");
            }
            InboundMessage::Pong => {
                tracing::trace!("Heartbeat acknowledged");
            }
            InboundMessage::Command { content } => {
                tracing::info!(command = %content, "Received command");
                let payload = self.run_command(content).await;
                self.send(transport, &OutboundMessage::command_result(payload))
                    .await?;
            }
            InboundMessage::Unrecognized { .. } => {
                tracing::warn!(kind = message.kind(), "Unknown message");
            }
        }
        Ok(())
    }

    async fn run_command(&self, command: &str) -> String {
        match self.executor.execute(command).await {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(command, "Execution error: {e}");
                format!("Error: {e}")
            }
        }
    }
}
