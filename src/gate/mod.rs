//! Connection admission.
//!
//! - [`request`]: the per-attempt input ([`ConnectionRequest`], [`DocumentType`])
//! - [`policy`]: the pure (document, role) to [`Capability`] table
//! - [`connection`]: the live connection handle the gate narrows
//! - [`admission`]: the [`ConnectionGate`] state machine

mod admission;
mod connection;
mod policy;
pub mod request;

pub use admission::{ConnectionGate, GateDecision, GateStage};
pub use connection::LiveConnection;
pub use policy::{AuthorizationPolicy, Capability};
pub use request::{ConnectionRequest, DocumentType, ProjectScope};
