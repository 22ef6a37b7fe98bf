//! Network module.
//!
//! Contains the Gateway (WebSocket listener), upgrade request parsing, the
//! control frames spoken before admission, and the session hand-off boundary.

mod gateway;
mod handoff;
mod handshake;
pub mod protocol;

pub use gateway::Gateway;
pub use handoff::{AdmittedSession, DetachedHandoff, SessionHandoff};
pub use handshake::HandshakeParts;
