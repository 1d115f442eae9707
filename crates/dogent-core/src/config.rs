//! Session configuration.

use std::{fmt, time::Duration};

use url::Url;

use crate::traits::ConfigError;

/// Delay between failed dial attempts.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Immutable configuration for the agent's single session.
///
/// Built once at startup and handed to the session manager, which owns it
/// for the rest of the process lifetime.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Control server endpoint (`ws://` or `wss://`).
    pub server_url: String,

    /// Authentication token sent in the handshake.
    pub token: String,

    /// Identifier this agent announces to the server.
    pub server_id: String,

    /// Wait between failed dial attempts.
    pub reconnect_delay: Duration,
}

impl SessionConfig {
    /// Create a configuration with the default reconnect delay.
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        token: impl Into<String>,
        server_id: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            token: token.into(),
            server_id: server_id.into(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Override the reconnect delay.
    #[must_use]
    pub const fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Parse and validate the server endpoint.
    ///
    /// # Errors
    /// Returns error if the URL does not parse, is not a WebSocket URL, or
    /// has no host.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.server_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server_url.clone(),
            source,
        })?;

        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::MissingHost(self.server_url.clone()));
        }

        Ok(url)
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server_url", &self.server_url)
            .field("token", &"<redacted>")
            .field("server_id", &self.server_id)
            .field("reconnect_delay", &self.reconnect_delay)
            .finish()
    }
}
