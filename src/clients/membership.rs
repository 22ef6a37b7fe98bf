//! Membership service client: (workspace, project, session) to project role.

use super::{MembershipResolver, endpoint, status_label};
use crate::config::ApiConfig;
use async_trait::async_trait;
use reqwest::header::COOKIE;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// Ordinal project role. Higher values carry more privilege.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectRole(pub u16);

impl ProjectRole {
    pub const GUEST: Self = Self(5);
    pub const VIEWER: Self = Self(10);
    /// Lowest role allowed to edit documents.
    pub const MEMBER: Self = Self(15);
    pub const ADMIN: Self = Self(20);
}

impl fmt::Display for ProjectRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The caller's membership in one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    pub role: ProjectRole,
}

/// Membership resolution failures.
#[derive(Debug, Error)]
pub enum MembershipError {
    #[error("workspace or project identifier is empty")]
    MissingScope,
    #[error("session credential is empty")]
    MissingCredential,
    #[error("membership service base URL cannot carry a path")]
    InvalidEndpoint,
    #[error("membership service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("caller is not a member of the project")]
    NotAMember,
    #[error("membership service answered {0}")]
    Status(reqwest::StatusCode),
}

/// HTTP client for
/// `GET /api/workspaces/{workspace}/projects/{project}/project-members/me/`.
#[derive(Debug, Clone)]
pub struct MembershipClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MembershipClient {
    pub fn new(http: reqwest::Client, config: &ApiConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
        }
    }

    async fn fetch(
        &self,
        workspace: &str,
        project: &str,
        credential: &str,
    ) -> Result<MembershipRecord, MembershipError> {
        let url = endpoint(
            &self.base_url,
            &[
                "api",
                "workspaces",
                workspace,
                "projects",
                project,
                "project-members",
                "me",
            ],
        )
        .ok_or(MembershipError::InvalidEndpoint)?;

        let response = self.http.get(url).header(COOKIE, credential).send().await;
        crate::metrics::record_upstream(
            "membership",
            status_label(response.as_ref().map(|r| r.status())),
        );

        let response = response?;
        let status = response.status();
        if status == reqwest::StatusCode::FORBIDDEN || status == reqwest::StatusCode::NOT_FOUND {
            return Err(MembershipError::NotAMember);
        }
        if !status.is_success() {
            return Err(MembershipError::Status(status));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MembershipResolver for MembershipClient {
    async fn resolve_membership(
        &self,
        workspace: &str,
        project: &str,
        credential: &str,
    ) -> Result<MembershipRecord, MembershipError> {
        if workspace.is_empty() || project.is_empty() {
            return Err(MembershipError::MissingScope);
        }
        if credential.is_empty() {
            return Err(MembershipError::MissingCredential);
        }
        match self.fetch(workspace, project, credential).await {
            Ok(record) => {
                debug!(%workspace, %project, role = %record.role, "Membership resolved");
                Ok(record)
            }
            Err(e) => {
                warn!(%workspace, %project, error = %e, "Membership lookup failed");
                Err(e)
            }
        }
    }
}
