//! Connection request: the per-attempt input of the gate.

use std::collections::HashMap;
use std::fmt;

/// Query parameter carrying the document-type discriminator.
pub const PARAM_DOCUMENT_TYPE: &str = "documentType";
/// Query parameter carrying the workspace identifier.
pub const PARAM_WORKSPACE: &str = "workspaceSlug";
/// Query parameter carrying the project identifier.
pub const PARAM_PROJECT: &str = "projectId";

/// Kind of document a connection wants to join.
///
/// Unknown discriminators are kept as [`DocumentType::Unrecognized`] so every
/// match over this type has to spell out what happens to them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DocumentType {
    /// A page that belongs to a project inside a workspace.
    ProjectPage,
    /// Any discriminator this build does not understand.
    Unrecognized(String),
}

impl DocumentType {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "project_page" => Self::ProjectPage,
            other => Self::Unrecognized(other.to_string()),
        }
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProjectPage => f.write_str("project_page"),
            Self::Unrecognized(raw) => write!(f, "unrecognized({raw})"),
        }
    }
}

/// Workspace and project a scoped document lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectScope<'a> {
    pub workspace: &'a str,
    pub project: &'a str,
}

/// One incoming connection attempt.
///
/// Empty strings are treated the same as absent values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionRequest {
    cookie: Option<String>,
    token: Option<String>,
    params: HashMap<String, String>,
}

impl ConnectionRequest {
    pub fn new(
        cookie: Option<String>,
        token: Option<String>,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            cookie,
            token,
            params,
        }
    }

    pub fn with_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.cookie = Some(cookie.into());
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Session credential, if present and non-empty.
    pub fn cookie(&self) -> Option<&str> {
        non_empty(self.cookie.as_deref())
    }

    /// Claimed identity token, if present and non-empty.
    pub fn token(&self) -> Option<&str> {
        non_empty(self.token.as_deref())
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        non_empty(self.params.get(key).map(String::as_str))
    }

    /// Document-type discriminator, `None` when absent.
    pub fn document_type(&self) -> Option<DocumentType> {
        self.param(PARAM_DOCUMENT_TYPE).map(DocumentType::parse)
    }

    /// Workspace and project identifiers, `None` unless both are present.
    pub fn project_scope(&self) -> Option<ProjectScope<'_>> {
        Some(ProjectScope {
            workspace: self.param(PARAM_WORKSPACE)?,
            project: self.param(PARAM_PROJECT)?,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
