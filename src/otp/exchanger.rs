//! Code-for-session exchange.

use std::sync::Arc;
use tracing::info;

use super::{normalize_email, valid_code};
use crate::error::AuthError;
use crate::guard::audit::{AuditAction, AuditHandle, AuditRecord, Origin};
use crate::guard::store::SessionStore;
use crate::identity::types::{Purpose, Session};
use crate::identity::IdentityBackend;

/// Converts an `(email, purpose, code)` triple into a [`Session`], or a
/// precise error the portal can act on.
pub struct TokenExchanger {
    backend: Arc<dyn IdentityBackend>,
    sessions: SessionStore,
    audit: AuditHandle,
}

impl TokenExchanger {
    #[must_use]
    pub fn new(backend: Arc<dyn IdentityBackend>, sessions: SessionStore, audit: AuditHandle) -> Self {
        Self {
            backend,
            sessions,
            audit,
        }
    }

    /// Exchange a user-entered code for a session.
    ///
    /// Malformed codes fail locally so an attempt is never burned on input
    /// that cannot possibly match. A successful exchange consumes the
    /// challenge; re-submitting the same code afterwards yields
    /// `AlreadyConsumed`, never a second session. The minted session is
    /// registered with the guard's session store so `authorize` can
    /// validate it.
    ///
    /// # Errors
    /// The closed taxonomy of code rejections plus `ProviderUnavailable`
    /// for transport failures and malformed provider responses.
    pub async fn exchange(
        &self,
        email: &str,
        purpose: Purpose,
        code: &str,
        origin: &Origin,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let code = code.trim();
        if !valid_code(code) {
            let err = AuthError::CodeInvalid {
                attempts_remaining: None,
            };
            self.audit.emit(AuditRecord::failure(
                AuditAction::Exchange,
                None,
                err.code(),
                origin,
            ));
            return Err(err);
        }

        match self.backend.verify_challenge(&email, purpose, code).await {
            Ok(session) => {
                // The backend already rejected malformed successes; this
                // holds the session invariants for everything downstream.
                if !session.is_well_formed() {
                    let err = AuthError::unavailable("provider minted an ill-formed session");
                    self.audit.emit(AuditRecord::failure(
                        AuditAction::Exchange,
                        None,
                        err.to_string(),
                        origin,
                    ));
                    return Err(err);
                }

                self.sessions.register(&session);
                info!(
                    email = %email,
                    purpose = purpose.as_str(),
                    identity_id = %session.identity.identity_id,
                    "code exchanged for session"
                );
                self.audit.emit(AuditRecord::success(
                    AuditAction::Exchange,
                    Some(session.identity.identity_id),
                    origin,
                ));
                Ok(session)
            }
            Err(err) => {
                self.audit.emit(AuditRecord::failure(
                    AuditAction::Exchange,
                    None,
                    err.to_string(),
                    origin,
                ));
                Err(err)
            }
        }
    }
}
