//! Upstream collaborators: the account service and the membership service.
//!
//! The gate only sees the [`IdentityResolver`] and [`MembershipResolver`]
//! traits, so tests can swap in fakes. [`IdentityClient`] and
//! [`MembershipClient`] are the HTTP implementations; neither retries or
//! caches.

mod identity;
mod membership;

pub use identity::{IdentityClient, IdentityError, UserIdentity};
pub use membership::{MembershipClient, MembershipError, MembershipRecord, ProjectRole};

use crate::config::ApiConfig;
use async_trait::async_trait;

/// Resolves a session credential to the user it belongs to.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve_identity(&self, credential: &str) -> Result<UserIdentity, IdentityError>;
}

/// Resolves the caller's role within a project.
#[async_trait]
pub trait MembershipResolver: Send + Sync {
    async fn resolve_membership(
        &self,
        workspace: &str,
        project: &str,
        credential: &str,
    ) -> Result<MembershipRecord, MembershipError>;
}

/// Build the HTTP client shared by both upstream clients.
pub fn build_http_client(config: &ApiConfig) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.as_str())
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Join path segments onto the API base URL, percent-encoding each one.
///
/// The trailing empty segment keeps the trailing slash the API expects.
fn endpoint(base: &url::Url, segments: &[&str]) -> Option<url::Url> {
    let mut url = base.clone();
    {
        let mut path = url.path_segments_mut().ok()?;
        path.pop_if_empty();
        path.extend(segments);
        path.push("");
    }
    Some(url)
}

/// Outcome label for upstream request metrics.
fn status_label(result: Result<reqwest::StatusCode, &reqwest::Error>) -> &'static str {
    match result {
        Ok(status) if status.is_success() => "ok",
        Ok(status) if status.is_client_error() => "client_error",
        Ok(_) => "server_error",
        Err(e) if e.is_timeout() => "timeout",
        Err(_) => "transport_error",
    }
}
