//! Live connection handle shared between the transport and the gate.
//!
//! The transport owns the connection; the gate writes the capability flag at
//! most once. The flag starts at read-write and can only be narrowed.

use super::policy::Capability;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use uuid::Uuid;

#[derive(Debug)]
pub struct LiveConnection {
    id: Uuid,
    read_only: AtomicBool,
    closed: CancellationToken,
}

impl LiveConnection {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            read_only: AtomicBool::new(false),
            closed: CancellationToken::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn capability(&self) -> Capability {
        if self.read_only.load(Ordering::Acquire) {
            Capability::ReadOnly
        } else {
            Capability::ReadWrite
        }
    }

    /// Apply a policy decision. Read-write never widens a narrowed connection.
    ///
    /// Returns `false` without touching the flag when the connection is
    /// already closed.
    pub fn apply(&self, capability: Capability) -> bool {
        if self.is_closed() {
            return false;
        }
        if capability.is_read_only() {
            self.read_only.store(true, Ordering::Release);
        }
        true
    }

    /// Mark the connection torn down. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called.
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.closed.cancelled()
    }
}

impl Default for LiveConnection {
    fn default() -> Self {
        Self::new()
    }
}
