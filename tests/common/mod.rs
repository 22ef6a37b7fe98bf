//! Integration test common infrastructure.
//!
//! Provides a fake account/membership API, a gateway spawner and a WebSocket
//! test client.

#![allow(dead_code)]

pub mod accounts;
pub mod client;
pub mod server;

#[allow(unused_imports)]
pub use accounts::{FakeAccounts, RunningAccounts};
#[allow(unused_imports)]
pub use client::TestClient;
#[allow(unused_imports)]
pub use server::{RecordingHandoff, TestGateway};
