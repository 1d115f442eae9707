//! Observable lifecycle state of the agent's session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the single session currently is in its connect cycle.
///
/// Exactly one value holds at a time; the agent never has more than one
/// live transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No transport is open.
    #[default]
    Disconnected,
    /// Dialing the control server.
    Connecting,
    /// Transport open, handshake being written.
    Authenticating,
    /// Reading and dispatching frames.
    Serving,
}

impl SessionState {
    /// Whether a transport is open in this state.
    #[must_use]
    pub const fn has_transport(self) -> bool {
        matches!(self, Self::Authenticating | Self::Serving)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Serving => "serving",
        };
        f.write_str(s)
    }
}
