//! Prometheus metrics collection for collab-gate.
//!
//! - `gate_decisions_total{outcome,reason}` - Decisions by outcome and rejection reason
//! - `gate_decision_duration_seconds` - Decision latency histogram
//! - `gate_admitted_total{capability}` - Admissions by granted capability
//! - `gate_upstream_requests_total{service,status}` - Identity/membership calls
//! - `gate_connections_active` - Open WebSocket connections
//!
//! Every recorder is a no-op until [`init`] has run.

use crate::error::Rejection;
use crate::gate::Capability;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Gate decisions by outcome (admitted/rejected/abandoned) and reason.
pub static DECISIONS: OnceLock<IntCounterVec> = OnceLock::new();

/// Admitted connections by capability.
pub static ADMITTED: OnceLock<IntCounterVec> = OnceLock::new();

/// Upstream requests by service and status class.
pub static UPSTREAM_REQUESTS: OnceLock<IntCounterVec> = OnceLock::new();

// ========================================================================
// Gauges and histograms
// ========================================================================

/// Currently open WebSocket connections.
pub static CONNECTIONS_ACTIVE: OnceLock<IntGauge> = OnceLock::new();

/// Time from request to decision.
pub static DECISION_LATENCY: OnceLock<Histogram> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at server startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(
                    error = %e,
                    concat!("Failed to register metric ", stringify!($metric))
                );
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        DECISIONS,
        IntCounterVec::new(
            Opts::new("gate_decisions_total", "Gate decisions by outcome"),
            &["outcome", "reason"]
        )
    );
    register!(
        ADMITTED,
        IntCounterVec::new(
            Opts::new("gate_admitted_total", "Admitted connections by capability"),
            &["capability"]
        )
    );
    register!(
        UPSTREAM_REQUESTS,
        IntCounterVec::new(
            Opts::new(
                "gate_upstream_requests_total",
                "Identity and membership requests"
            ),
            &["service", "status"]
        )
    );
    register!(
        CONNECTIONS_ACTIVE,
        IntGauge::new("gate_connections_active", "Open WebSocket connections")
    );
    register!(
        DECISION_LATENCY,
        Histogram::with_opts(
            HistogramOpts::new("gate_decision_duration_seconds", "Gate decision latency")
                .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0])
        )
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Recorders
// ============================================================================

#[inline]
pub fn record_admission(capability: Capability) {
    if let Some(c) = DECISIONS.get() {
        c.with_label_values(&["admitted", "none"]).inc();
    }
    if let Some(c) = ADMITTED.get() {
        c.with_label_values(&[capability.as_str()]).inc();
    }
}

#[inline]
pub fn record_rejection(rejection: Rejection) {
    if let Some(c) = DECISIONS.get() {
        c.with_label_values(&["rejected", rejection.error_code()]).inc();
    }
}

/// Record an attempt dropped because its connection closed first.
#[inline]
pub fn record_abandoned() {
    if let Some(c) = DECISIONS.get() {
        c.with_label_values(&["abandoned", "connection_closed"]).inc();
    }
}

#[inline]
pub fn record_decision_latency(duration_secs: f64) {
    if let Some(h) = DECISION_LATENCY.get() {
        h.observe(duration_secs);
    }
}

#[inline]
pub fn record_upstream(service: &str, status: &str) {
    if let Some(c) = UPSTREAM_REQUESTS.get() {
        c.with_label_values(&[service, status]).inc();
    }
}

#[inline]
pub fn connection_opened() {
    if let Some(g) = CONNECTIONS_ACTIVE.get() {
        g.inc();
    }
}

#[inline]
pub fn connection_closed() {
    if let Some(g) = CONNECTIONS_ACTIVE.get() {
        g.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();

        record_admission(Capability::ReadOnly);
        record_rejection(Rejection::TokenMismatch);
        record_upstream("identity", "ok");
        record_decision_latency(0.002);

        let output = gather_metrics();
        assert!(output.contains("gate_decisions_total"));
        assert!(output.contains("token_mismatch"));
        assert!(output.contains("gate_admitted_total"));
        assert!(output.contains("read-only"));
        assert!(output.contains("gate_upstream_requests_total"));
    }
}
