//! Wire protocol and transports for the dogent agent.
//!
//! Provides:
//! - Wire protocol (one JSON object per frame)
//! - WebSocket client transport (feature: websocket)

pub mod protocol;

#[cfg(feature = "websocket")]
pub mod websocket;

pub use protocol::{AgentReply, AuthRecord, DecodeError, InboundMessage, OutboundMessage};

#[cfg(feature = "websocket")]
pub use websocket::{WsConnector, WsTransport};
