//! Hand-off of admitted sessions to the document synchronization engine.
//!
//! The engine itself lives outside this crate. The gateway gives it one
//! [`AdmittedSession`] per admitted connection and pumps WebSocket binary
//! frames through the session's channels until either side hangs up.

use crate::clients::UserIdentity;
use crate::gate::{Capability, ConnectionRequest, LiveConnection};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// An admitted connection, ready for the synchronization engine.
#[derive(Debug)]
pub struct AdmittedSession {
    pub connection: Arc<LiveConnection>,
    pub user: UserIdentity,
    pub request: ConnectionRequest,
    /// Binary frames received from the client.
    pub inbound: mpsc::Receiver<Vec<u8>>,
    /// Binary frames to deliver to the client. Dropping it ends the session.
    pub outbound: mpsc::Sender<Vec<u8>>,
}

impl AdmittedSession {
    #[inline]
    pub fn capability(&self) -> Capability {
        self.connection.capability()
    }
}

/// Receives admitted sessions.
#[async_trait]
pub trait SessionHandoff: Send + Sync {
    /// Take ownership of a session. Should return promptly; long-running work
    /// belongs on its own task.
    async fn admit(&self, session: AdmittedSession);
}

/// Handoff used when no engine is attached: logs and drains each session.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedHandoff;

#[async_trait]
impl SessionHandoff for DetachedHandoff {
    async fn admit(&self, session: AdmittedSession) {
        let AdmittedSession {
            connection,
            user,
            mut inbound,
            outbound,
            ..
        } = session;
        info!(
            connection = %connection.id(),
            user_id = %user.id,
            capability = %connection.capability(),
            "Session detached (no sync engine attached)"
        );
        tokio::spawn(async move {
            let mut frames = 0usize;
            let mut bytes = 0usize;
            while let Some(frame) = inbound.recv().await {
                frames += 1;
                bytes += frame.len();
            }
            drop(outbound);
            debug!(connection = %connection.id(), frames, bytes, "Detached session drained");
        });
    }
}
