//! Admission error handling for collab-gate.
//!
//! Every failure inside the gate resolves to one [`Rejection`] kind. Reason
//! codes are for server-side logs and metrics; clients only ever see
//! [`Rejection::CLIENT_MESSAGE`].

use thiserror::Error;

/// Why a connection attempt was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum Rejection {
    /// Session credential or identity token missing.
    #[error("malformed request: credential or token missing")]
    MalformedRequest,

    /// Account service failed or returned no identity.
    #[error("identity unavailable")]
    IdentityUnavailable,

    /// Claimed token names a different account than the session.
    #[error("token does not match the authenticated user")]
    TokenMismatch,

    /// Document type missing or not recognized.
    #[error("unsupported document type")]
    UnsupportedDocumentType,

    /// Scope identifiers missing for a scoped document type.
    #[error("incomplete parameters: workspace or project missing")]
    IncompleteParameters,

    /// Membership service failed or the caller is not a member.
    #[error("membership unavailable")]
    MembershipUnavailable,
}

impl Rejection {
    /// The only text a refused client is shown.
    pub const CLIENT_MESSAGE: &'static str = "connection refused";

    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MalformedRequest => "malformed_request",
            Self::IdentityUnavailable => "identity_unavailable",
            Self::TokenMismatch => "token_mismatch",
            Self::UnsupportedDocumentType => "unsupported_document_type",
            Self::IncompleteParameters => "incomplete_parameters",
            Self::MembershipUnavailable => "membership_unavailable",
        }
    }
}
