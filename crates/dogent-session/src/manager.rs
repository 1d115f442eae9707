//! Session manager: the connect / authenticate / serve / reconnect loop.

use dogent_core::{
    CommandExecutor, ConfigError, Connector, SessionConfig, SessionState, Transport,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use url::Url;

use crate::handler::{ProtocolHandler, ServeExit};

/// Session manager error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Keeps exactly one authenticated connection to the control server alive.
///
/// Dial failures are retried forever with a fixed delay. A connection that
/// fails after it was established is closed and redialed immediately.
pub struct SessionManager<C, E> {
    config: SessionConfig,
    connector: C,
    handler: ProtocolHandler<E>,
    state: watch::Sender<SessionState>,
}

impl<C, E> SessionManager<C, E>
where
    C: Connector,
    E: CommandExecutor,
{
    /// Create a new session manager.
    #[must_use]
    pub fn new(config: SessionConfig, connector: C, executor: E) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            config,
            connector,
            handler: ProtocolHandler::new(executor),
            state,
        }
    }

    /// The configuration this manager was built with.
    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current session state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Subscribe to session state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Run the session loop.
    ///
    /// Only returns `Ok` once `shutdown` is cancelled.
    ///
    /// # Errors
    /// Returns error if the configured endpoint is invalid. Nothing else is
    /// fatal.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<(), SessionError> {
        let endpoint = self.config.endpoint().inspect_err(|e| {
            tracing::error!("Invalid server configuration: {e}");
        })?;

        let mut cycle: u64 = 0;
        while !shutdown.is_cancelled() {
            cycle += 1;
            let span = tracing::info_span!("session", cycle, server_id = %self.config.server_id);
            self.run_cycle(&endpoint, &shutdown).instrument(span).await;
        }

        self.set_state(SessionState::Disconnected);
        tracing::info!("Session manager stopped");
        Ok(())
    }

    /// One connect, authenticate, serve pass. Always leaves no transport open.
    async fn run_cycle(&self, endpoint: &Url, shutdown: &CancellationToken) {
        let Some(mut transport) = self.connect(endpoint, shutdown).await else {
            return;
        };

        self.set_state(SessionState::Authenticating);
        if let Err(e) = self.handler.authenticate(&mut transport, &self.config).await {
            tracing::warn!("Authentication write failed: {e}");
            transport.close().await;
            self.set_state(SessionState::Disconnected);
            return;
        }

        self.set_state(SessionState::Serving);
        match self.handler.serve(&mut transport, shutdown).await {
            ServeExit::ReadFailed(e) => tracing::warn!("Connection lost: {e}"),
            ServeExit::ReplyFailed(e) => tracing::warn!("Connection unhealthy, reply failed: {e}"),
            ServeExit::Cancelled => tracing::info!("Shutdown requested"),
        }

        transport.close().await;
        self.set_state(SessionState::Disconnected);
    }

    /// Dial until a transport opens or shutdown is requested.
    async fn connect(&self, endpoint: &Url, shutdown: &CancellationToken) -> Option<C::Transport> {
        let delay = self.config.reconnect_delay;
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            self.set_state(SessionState::Connecting);
            tracing::info!(attempt, "Connecting to {endpoint}...");

            let dialed = tokio::select! {
                biased;
                () = shutdown.cancelled() => return None,
                dialed = self.connector.connect(endpoint) => dialed,
            };

            match dialed {
                Ok(transport) => {
                    tracing::info!(attempt, "Connected");
                    return Some(transport);
                }
                Err(e) => {
                    tracing::warn!(attempt, ?delay, "Connection failed: {e}. Retrying");
                    self.set_state(SessionState::Disconnected);
                    tokio::select! {
                        biased;
                        () = shutdown.cancelled() => return None,
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    fn set_state(&self, next: SessionState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            tracing::debug!(from = %current, to = %next, "Session state changed");
            *current = next;
            true
        });
    }
}
