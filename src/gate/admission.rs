//! Connection gate - the admission decision for one connection attempt.
//!
//! The gate walks a single forward pass:
//!
//! ```text
//! Start -> IdentityPending -> IdentityResolved -> ParamsValidated
//!       -> (MembershipPending -> MembershipResolved) -> Decided
//! ```
//!
//! The only suspension points are the identity and membership lookups. The
//! capability flag is written after both have completed, and only if the
//! connection is still open.

use super::connection::LiveConnection;
use super::policy::{AuthorizationPolicy, Capability};
use super::request::{ConnectionRequest, DocumentType};
use crate::clients::{IdentityResolver, MembershipResolver, UserIdentity};
use crate::error::Rejection;
use crate::telemetry::DecisionTimer;
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Outcome of one connection attempt.
pub type GateDecision = Result<UserIdentity, Rejection>;

/// Stages of the admission state machine, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateStage {
    Start,
    IdentityPending,
    IdentityResolved,
    ParamsValidated,
    MembershipPending,
    MembershipResolved,
    Decided,
}

/// Orchestrates identity, membership and policy for each attempt.
///
/// Holds no per-attempt state, so one gate serves every connection
/// concurrently.
#[derive(Clone)]
pub struct ConnectionGate {
    identity: Arc<dyn IdentityResolver>,
    membership: Arc<dyn MembershipResolver>,
}

impl ConnectionGate {
    pub fn new(
        identity: Arc<dyn IdentityResolver>,
        membership: Arc<dyn MembershipResolver>,
    ) -> Self {
        Self {
            identity,
            membership,
        }
    }

    /// Decide whether `request` may join, narrowing `connection` on admission.
    pub async fn authorize(
        &self,
        request: &ConnectionRequest,
        connection: &LiveConnection,
    ) -> GateDecision {
        let _timer = DecisionTimer::new();
        let decision = self.evaluate(request, connection).await;
        enter(connection, GateStage::Decided);

        match decision {
            Ok(Admission {
                user,
                capability,
                applied: true,
            }) => {
                info!(
                    connection = %connection.id(),
                    user_id = %user.id,
                    %capability,
                    "Connection admitted"
                );
                crate::metrics::record_admission(capability);
                Ok(user)
            }
            Ok(Admission {
                user,
                capability,
                applied: false,
            }) => {
                debug!(
                    connection = %connection.id(),
                    user_id = %user.id,
                    %capability,
                    "Connection closed before capability could be applied"
                );
                crate::metrics::record_abandoned();
                Ok(user)
            }
            Err(rejection) => {
                info!(
                    connection = %connection.id(),
                    reason = rejection.error_code(),
                    "Connection rejected"
                );
                crate::metrics::record_rejection(rejection);
                Err(rejection)
            }
        }
    }

    /// Like [`authorize`](Self::authorize), but abandons the attempt as soon
    /// as the connection closes. Returns `None` when abandoned.
    pub async fn authorize_until_closed(
        &self,
        request: &ConnectionRequest,
        connection: &LiveConnection,
    ) -> Option<GateDecision> {
        tokio::select! {
            biased;
            _ = connection.closed() => {
                debug!(
                    connection = %connection.id(),
                    "Connection closed during admission; abandoning"
                );
                crate::metrics::record_abandoned();
                None
            }
            decision = self.authorize(request, connection) => Some(decision),
        }
    }

    async fn evaluate(
        &self,
        request: &ConnectionRequest,
        connection: &LiveConnection,
    ) -> Result<Admission, Rejection> {
        enter(connection, GateStage::Start);
        let (Some(credential), Some(token)) = (request.cookie(), request.token()) else {
            return Err(Rejection::MalformedRequest);
        };

        enter(connection, GateStage::IdentityPending);
        let user = self
            .identity
            .resolve_identity(credential)
            .await
            .map_err(|_| Rejection::IdentityUnavailable)?;

        enter(connection, GateStage::IdentityResolved);
        if user.id != token {
            return Err(Rejection::TokenMismatch);
        }
        let document = request
            .document_type()
            .ok_or(Rejection::UnsupportedDocumentType)?;

        enter(connection, GateStage::ParamsValidated);
        let role = match &document {
            DocumentType::ProjectPage => {
                let scope = request
                    .project_scope()
                    .ok_or(Rejection::IncompleteParameters)?;

                enter(connection, GateStage::MembershipPending);
                let record = self
                    .membership
                    .resolve_membership(scope.workspace, scope.project, credential)
                    .await
                    .map_err(|_| Rejection::MembershipUnavailable)?;

                enter(connection, GateStage::MembershipResolved);
                record.role
            }
            _ => return Err(Rejection::UnsupportedDocumentType),
        };

        let capability = AuthorizationPolicy::decide(&document, role)?;
        Ok(Admission {
            user,
            capability,
            applied: connection.apply(capability),
        })
    }
}

/// A successful pass through the gate.
struct Admission {
    user: UserIdentity,
    /// What the policy granted, whether or not it reached the connection.
    capability: Capability,
    /// False when the connection closed before the capability was applied.
    applied: bool,
}

#[inline]
fn enter(connection: &LiveConnection, stage: GateStage) {
    trace!(connection = %connection.id(), ?stage, "Gate stage");
}
