//! Challenge issuance with abuse controls.

use std::sync::Arc;
use tracing::info;

use super::{normalize_email, valid_email};
use crate::error::AuthError;
use crate::guard::audit::{AuditAction, AuditHandle, AuditRecord, Origin};
use crate::identity::types::Purpose;
use crate::identity::IdentityBackend;

/// Acknowledgement that a challenge was issued and is being delivered out
/// of band. The code itself never passes through this subsystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeReceipt {
    pub email: String,
    pub purpose: Purpose,
}

/// Turns "a user wants a one-time code for purpose P" into a delivered
/// code, while preventing abuse.
pub struct ChallengeCoordinator {
    backend: Arc<dyn IdentityBackend>,
    audit: AuditHandle,
}

impl ChallengeCoordinator {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, audit: AuditHandle) -> Self {
        Self { backend, audit }
    }

    /// Request a one-time code for `(email, purpose)`.
    ///
    /// A successful request supersedes any outstanding challenge for the
    /// pair; the prior code becomes unusable. Supersession and throttling
    /// live at the provider, which alone knows the true throttle state;
    /// `RateLimited` carries the provider-reported wait.
    ///
    /// # Errors
    /// `InvalidEmail` locally; `RateLimited` / `ProviderUnavailable` from
    /// the provider.
    pub async fn request_challenge(
        &self,
        email: &str,
        purpose: Purpose,
        origin: &Origin,
    ) -> Result<ChallengeReceipt, AuthError> {
        let email = normalize_email(email);
        if !valid_email(&email) {
            self.audit.emit(AuditRecord::failure(
                AuditAction::ChallengeRequest,
                None,
                AuthError::InvalidEmail.code(),
                origin,
            ));
            return Err(AuthError::InvalidEmail);
        }

        match self.backend.issue_challenge(&email, purpose).await {
            Ok(()) => {
                info!(email = %email, purpose = purpose.as_str(), "challenge issued");
                self.audit.emit(AuditRecord::success(
                    AuditAction::ChallengeRequest,
                    None,
                    origin,
                ));
                Ok(ChallengeReceipt { email, purpose })
            }
            Err(err) => {
                self.audit.emit(AuditRecord::failure(
                    AuditAction::ChallengeRequest,
                    None,
                    err.to_string(),
                    origin,
                ));
                Err(err)
            }
        }
    }
}
