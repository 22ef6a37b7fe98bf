//! Test gateway management.
//!
//! Spawns an in-process gateway bound to an ephemeral port, wired to real
//! HTTP clients pointed at a fake account API.

use async_trait::async_trait;
use collab_gate::clients::{IdentityClient, MembershipClient, build_http_client};
use collab_gate::config::{ApiConfig, ListenConfig};
use collab_gate::gate::{Capability, ConnectionGate};
use collab_gate::network::{AdmittedSession, Gateway, SessionHandoff};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// What the handoff saw for one admitted session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmittedSummary {
    pub user_id: String,
    pub capability: Capability,
}

/// Handoff that reports each admission and echoes frames back to the client.
pub struct RecordingHandoff {
    admitted: mpsc::UnboundedSender<AdmittedSummary>,
}

impl RecordingHandoff {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<AdmittedSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { admitted: tx }, rx)
    }
}

#[async_trait]
impl SessionHandoff for RecordingHandoff {
    async fn admit(&self, session: AdmittedSession) {
        let _ = self.admitted.send(AdmittedSummary {
            user_id: session.user.id.clone(),
            capability: session.capability(),
        });
        let AdmittedSession {
            mut inbound,
            outbound,
            ..
        } = session;
        tokio::spawn(async move {
            while let Some(frame) = inbound.recv().await {
                if outbound.send(frame).await.is_err() {
                    break;
                }
            }
        });
    }
}

/// A running gateway. Aborted on drop.
pub struct TestGateway {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl TestGateway {
    pub async fn spawn(
        api: &ApiConfig,
        allow_origins: Vec<String>,
        auth_timeout: Duration,
        handoff: Arc<dyn SessionHandoff>,
    ) -> anyhow::Result<Self> {
        let http = build_http_client(api);
        let gate = ConnectionGate::new(
            Arc::new(IdentityClient::new(http.clone(), api)),
            Arc::new(MembershipClient::new(http, api)),
        );
        let listen = ListenConfig {
            address: "127.0.0.1:0".parse()?,
            allow_origins,
            auth_timeout_secs: auth_timeout.as_secs().max(1),
        };
        let gateway = Gateway::bind(listen, None, gate, handoff).await?;
        let addr = gateway.local_addr()?;
        let task = tokio::spawn(async move {
            let _ = gateway.run().await;
        });
        Ok(Self { addr, task })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.task.abort();
    }
}
