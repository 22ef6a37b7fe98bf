//! Authorization policy: (document type, role) to connection capability.
//!
//! Pure and stateless. Every document type gets an explicit arm; anything
//! without one is denied.

use super::request::DocumentType;
use crate::clients::ProjectRole;
use crate::error::Rejection;
use serde::Serialize;
use std::fmt;

/// Mode granted to an admitted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    ReadWrite,
    ReadOnly,
}

impl Capability {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ReadWrite => "read-write",
            Self::ReadOnly => "read-only",
        }
    }

    #[inline]
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnly)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The admission policy table.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationPolicy;

impl AuthorizationPolicy {
    /// Decide the capability for a caller holding `role` on `document`.
    ///
    /// A resolved membership is always at least viewable; the role only
    /// narrows write access.
    pub fn decide(document: &DocumentType, role: ProjectRole) -> Result<Capability, Rejection> {
        match document {
            DocumentType::ProjectPage if role < ProjectRole::MEMBER => Ok(Capability::ReadOnly),
            DocumentType::ProjectPage => Ok(Capability::ReadWrite),
            _ => Err(Rejection::UnsupportedDocumentType),
        }
    }
}
