//! collab-gate - admission gate for live collaborative document sessions.

use collab_gate::clients::{IdentityClient, MembershipClient, build_http_client};
use collab_gate::config::{self, Config};
use collab_gate::gate::ConnectionGate;
use collab_gate::network::{DetachedHandoff, Gateway};
use collab_gate::{http, metrics};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = config::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "Refusing to start with {} configuration error(s). See messages above.",
            errors.len()
        ));
    }

    info!(
        server = %config.server.name,
        api = %config.api.base_url,
        "Starting collab-gate"
    );

    // Convention: metrics_port = 0 disables the HTTP endpoint (used by tests).
    let metrics_port = config.server.metrics_port;
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        info!("Metrics initialized");

        let server_name = config.server.name.clone();
        tokio::spawn(async move {
            http::run_http_server(metrics_port, server_name).await;
        });
        info!(port = metrics_port, "Metrics HTTP server started");
    }

    let http_client = build_http_client(&config.api);
    let gate = ConnectionGate::new(
        Arc::new(IdentityClient::new(http_client.clone(), &config.api)),
        Arc::new(MembershipClient::new(http_client, &config.api)),
    );

    let gateway = Gateway::bind(config.listen, config.tls, gate, Arc::new(DetachedHandoff)).await?;
    gateway.run().await?;

    Ok(())
}
