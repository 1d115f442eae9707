//! Core abstractions for the dogent remote-control agent.
//!
//! This crate provides the pieces every other crate agrees on:
//! - `SessionConfig` - Immutable endpoint/credential record
//! - `SessionState` - Observable connect-cycle state
//! - `Transport`, `Connector`, `CommandExecutor` traits and their errors

pub mod config;
pub mod state;
pub mod traits;

pub use config::{DEFAULT_RECONNECT_DELAY, SessionConfig};
pub use state::SessionState;
pub use traits::{
    CommandExecutor, ConfigError, Connector, ExecutionError, Frame, Transport, TransportError,
};
