//! Connection lifecycle and protocol handling for the dogent agent.
//!
//! Provides:
//! - `SessionManager` - Connect, authenticate, serve, reconnect forever
//! - `ProtocolHandler` - Handshake, receive loop and command dispatch

pub mod handler;
pub mod manager;

pub use handler::{ProtocolHandler, ServeExit};
pub use manager::{SessionError, SessionManager};
