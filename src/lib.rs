//! collab-gate - admission gate for a real-time collaborative document server.
//!
//! Before a live-editing session may join a shared document, the gate
//! resolves the caller's identity, checks the claimed token, resolves their
//! project role and narrows the connection to read-only when the role is
//! below member.

pub mod clients;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod metrics;
pub mod network;
pub mod telemetry;

pub use error::Rejection;
pub use gate::{Capability, ConnectionGate, ConnectionRequest, GateDecision, LiveConnection};
