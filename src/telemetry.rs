//! Telemetry utilities for decision timing and connection spans.

use std::time::Instant;

/// Guard for timing one gate decision.
///
/// Records decision latency when dropped, including abandoned attempts.
pub struct DecisionTimer {
    start: Instant,
}

impl DecisionTimer {
    /// Start timing a decision.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for DecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DecisionTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_decision_latency(duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use std::net::SocketAddr;
    use tracing::{Span, info_span};
    use uuid::Uuid;

    /// Create a span for a client connection.
    pub fn connection(id: Uuid, addr: SocketAddr) -> Span {
        info_span!("connection", id = %id, addr = %addr)
    }
}
