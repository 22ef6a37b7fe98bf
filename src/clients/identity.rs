//! Account service client: session cookie to user identity.

use super::{IdentityResolver, endpoint, status_label};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Resolved caller identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Stable user identifier; the claimed token must equal it.
    pub id: String,
    /// Human-readable name shown to collaborators.
    #[serde(rename = "display_name")]
    pub name: String,
}

/// Identity resolution failures.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("session credential is empty")]
    MissingCredential,
    #[error("account service base URL cannot carry a path")]
    InvalidEndpoint,
    #[error("account service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("account service answered {0}")]
    Status(reqwest::StatusCode),
    #[error("account service returned an identity without an id")]
    EmptyIdentity,
}

/// HTTP client for `GET /api/users/me/`.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: Url,
}

impl IdentityClient {
    pub fn new(http: reqwest::Client, config: &ApiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    async fn fetch(&self, credential: &str) -> Result<UserIdentity, IdentityError> {
        let url = endpoint(&self.base_url, &["api", "users", "me"])
            .ok_or(IdentityError::InvalidEndpoint)?;

        let response = self.http.get(url).header(COOKIE, credential).send().await;
        crate::metrics::record_upstream(
            "identity",
            status_label(response.as_ref().map(|r| r.status())),
        );

        let response = response?;
        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Status(status));
        }

        let identity: UserIdentity = response.json().await?;
        if identity.id.is_empty() {
            return Err(IdentityError::EmptyIdentity);
        }
        Ok(identity)
    }
}

#[async_trait]
impl IdentityResolver for IdentityClient {
    async fn resolve_identity(&self, credential: &str) -> Result<UserIdentity, IdentityError> {
        if credential.is_empty() {
            return Err(IdentityError::MissingCredential);
        }
        match self.fetch(credential).await {
            Ok(identity) => {
                debug!(user_id = %identity.id, "Identity resolved");
                Ok(identity)
            }
            Err(e) => {
                warn!(error = %e, "Identity lookup failed");
                Err(e)
            }
        }
    }
}
