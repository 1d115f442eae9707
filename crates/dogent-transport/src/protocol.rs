//! Wire protocol between the agent and the control server.
//!
//! Every frame is a single JSON object. Server frames carry a `type`
//! discriminant; the agent's handshake frame does not.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Frame decode error.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON frame: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Invalid {kind:?} frame: {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Message from server to agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Informational text from the server.
    Status { content: String },
    /// Heartbeat acknowledgment.
    Pong,
    /// Shell command to execute.
    Command { content: String },
    /// Any other discriminant, or none at all.
    Unrecognized { kind: Option<String> },
}

/// Schema for the kinds the agent understands.
#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownMessage {
    Status {
        #[serde(default, deserialize_with = "text_or_empty")]
        content: String,
    },
    Pong,
    Command {
        #[serde(default, deserialize_with = "text_or_empty")]
        content: String,
    },
    #[serde(other)]
    Other,
}

/// Missing, null or non-string `content` reads as empty text.
fn text_or_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        _ => String::new(),
    })
}

impl InboundMessage {
    /// Decode one frame.
    ///
    /// # Errors
    /// Returns error if the frame is not a JSON object, or if its `type`
    /// cannot be read as a discriminant.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let object: Map<String, Value> = serde_json::from_slice(frame)?;

        let kind = match object.get("type") {
            None => return Ok(Self::Unrecognized { kind: None }),
            Some(Value::String(s)) => s.clone(),
            // Never let a numeric tag select a variant by index.
            Some(other) => return Ok(Self::Unrecognized { kind: Some(other.to_string()) }),
        };

        let known = KnownMessage::deserialize(Value::Object(object))
            .map_err(|source| DecodeError::InvalidPayload {
                kind: kind.clone(),
                source,
            })?;

        Ok(match known {
            KnownMessage::Status { content } => Self::Status { content },
            KnownMessage::Pong => Self::Pong,
            KnownMessage::Command { content } => Self::Command { content },
            KnownMessage::Other => Self::Unrecognized { kind: Some(kind) },
        })
    }

    /// The discriminant as it appeared on the wire.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Status { .. } => "status",
            Self::Pong => "pong",
            Self::Command { .. } => "command",
            Self::Unrecognized { kind } => kind.as_deref().unwrap_or("<missing>"),
        }
    }
}

/// Handshake record, sent once right after connecting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthRecord {
    pub token: String,
    pub server_id: String,
}

/// Typed reply from agent to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentReply {
    /// Output (or error text) of one executed command.
    CommandResult { content: String },
}

/// Message from agent to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Auth(AuthRecord),
    Reply(AgentReply),
}

impl OutboundMessage {
    /// Create the handshake message.
    #[must_use]
    pub fn auth(token: impl Into<String>, server_id: impl Into<String>) -> Self {
        Self::Auth(AuthRecord {
            token: token.into(),
            server_id: server_id.into(),
        })
    }

    /// Create a command result message.
    #[must_use]
    pub fn command_result(content: impl Into<String>) -> Self {
        Self::Reply(AgentReply::CommandResult {
            content: content.into(),
        })
    }

    /// Encode as a JSON text frame.
    ///
    /// # Errors
    /// Returns error if serialization fails.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
