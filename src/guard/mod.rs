//! Bearer-token guard: authorize, refresh, revoke, audit.
//!
//! Flow Overview: each request moves through
//! `Unauthenticated -> TokenPresent -> {Valid, Expired, Revoked, Malformed}`
//! and ends `Authorized` or `Rejected`. The revocation check runs before any
//! claim validation so a still-unexpired-but-revoked token is rejected
//! without provider work. All stores are injected at construction; an
//! isolated guard per test case needs nothing global.

pub mod audit;
pub mod revocation;
pub mod store;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{AuthError, AuthFailure};
use crate::identity::types::{
    now_unix_seconds, token_signature, well_formed_token, IdentityContext, Session,
};
use crate::identity::IdentityBackend;
use audit::{AuditAction, AuditHandle, AuditRecord, Origin};
use revocation::RevocationStore;
use store::SessionStore;

const DEFAULT_MAX_TOKEN_LIFETIME_SECONDS: i64 = 15 * 60;
const DEFAULT_PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// Guard tunables; the lifetime bound drives revocation purging.
#[derive(Clone, Copy, Debug)]
pub struct GuardConfig {
    max_token_lifetime_seconds: i64,
    purge_interval: Duration,
}

impl GuardConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_token_lifetime_seconds: DEFAULT_MAX_TOKEN_LIFETIME_SECONDS,
            purge_interval: DEFAULT_PURGE_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_max_token_lifetime_seconds(mut self, seconds: i64) -> Self {
        self.max_token_lifetime_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_purge_interval(mut self, interval: Duration) -> Self {
        self.purge_interval = interval;
        self
    }

    #[must_use]
    pub fn max_token_lifetime_seconds(&self) -> i64 {
        self.max_token_lifetime_seconds
    }

    #[must_use]
    pub fn purge_interval(&self) -> Duration {
        self.purge_interval
    }
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-side session guard for protected endpoints.
pub struct SessionGuard {
    backend: Arc<dyn IdentityBackend>,
    sessions: SessionStore,
    revocations: RevocationStore,
    audit: AuditHandle,
    config: GuardConfig,
}

impl SessionGuard {
    #[must_use]
    pub fn new(
        backend: Arc<dyn IdentityBackend>,
        sessions: SessionStore,
        revocations: RevocationStore,
        audit: AuditHandle,
        config: GuardConfig,
    ) -> Self {
        Self {
            backend,
            sessions,
            revocations,
            audit,
            config,
        }
    }

    /// Validate a bearer token and resolve it to an identity context.
    ///
    /// No network round-trip: revocation first, then the provider-issued
    /// claims tracked in the session store. An unknown signature means the
    /// session no longer validates and maps to `Expired`.
    ///
    /// # Errors
    /// One [`AuthFailure`] per rejection state; each maps to 401 with its
    /// reason code.
    pub fn authorize(
        &self,
        bearer: Option<&str>,
        origin: &Origin,
    ) -> Result<IdentityContext, AuthFailure> {
        let Some(token) = bearer else {
            self.audit.emit(AuditRecord::failure(
                AuditAction::Authorize,
                None,
                AuthFailure::NoToken.reason_code(),
                origin,
            ));
            return Err(AuthFailure::NoToken);
        };

        if !well_formed_token(token) {
            self.audit.emit(AuditRecord::failure(
                AuditAction::Authorize,
                None,
                AuthFailure::Malformed.reason_code(),
                origin,
            ));
            return Err(AuthFailure::Malformed);
        }

        let signature = token_signature(token);

        if self.revocations.contains(&signature) {
            let identity_id = self
                .sessions
                .lookup(&signature)
                .map(|record| record.identity.identity_id);
            self.audit.emit(AuditRecord::failure(
                AuditAction::Authorize,
                identity_id,
                AuthFailure::Revoked.reason_code(),
                origin,
            ));
            return Err(AuthFailure::Revoked);
        }

        match self.sessions.lookup(&signature) {
            Some(record) if now_unix_seconds() <= record.expires_at => {
                self.audit.emit(AuditRecord::success(
                    AuditAction::Authorize,
                    Some(record.identity.identity_id),
                    origin,
                ));
                Ok(record.identity)
            }
            Some(record) => {
                self.audit.emit(AuditRecord::failure(
                    AuditAction::Authorize,
                    Some(record.identity.identity_id),
                    AuthFailure::Expired.reason_code(),
                    origin,
                ));
                Err(AuthFailure::Expired)
            }
            None => {
                self.audit.emit(AuditRecord::failure(
                    AuditAction::Authorize,
                    None,
                    AuthFailure::Expired.reason_code(),
                    origin,
                ));
                Err(AuthFailure::Expired)
            }
        }
    }

    /// Mint a new session from a refresh token.
    ///
    /// Rotation is enforced by the provider: each successful refresh
    /// invalidates the token that was used, bounding the blast radius of a
    /// leaked refresh token.
    ///
    /// # Errors
    /// `RefreshInvalid` / `RefreshExpired` on rejection, transient errors
    /// otherwise.
    pub async fn refresh(
        &self,
        refresh_token: &str,
        origin: &Origin,
    ) -> Result<Session, AuthError> {
        match self.backend.refresh_session(refresh_token).await {
            Ok(session) => {
                self.sessions.register(&session);
                self.audit.emit(AuditRecord::success(
                    AuditAction::Refresh,
                    Some(session.identity.identity_id),
                    origin,
                ));
                Ok(session)
            }
            Err(err) => {
                self.audit.emit(AuditRecord::failure(
                    AuditAction::Refresh,
                    None,
                    err.to_string(),
                    origin,
                ));
                Err(err)
            }
        }
    }

    /// Revoke an access token before its natural expiry. Idempotent.
    ///
    /// The local revocation set is authoritative for this guard; the
    /// provider is informed best-effort so sibling deployments converge.
    pub async fn revoke(&self, access_token: &str, origin: &Origin) {
        let signature = token_signature(access_token);
        self.revocations.revoke(&signature, now_unix_seconds());
        let removed = self.sessions.remove(&signature);

        if let Err(err) = self.backend.revoke(&signature).await {
            warn!(error = %err, "provider revocation failed; local revocation stands");
        }

        self.audit.emit(AuditRecord::success(
            AuditAction::Revoke,
            removed.map(|record| record.identity.identity_id),
            origin,
        ));
    }

    /// Track a session minted by the exchange path.
    pub fn register_session(&self, session: &Session) {
        self.sessions.register(session);
    }

    /// Sweep expired revocation entries and session records.
    /// Returns `(revocations_removed, sessions_removed)`.
    pub fn purge_expired(&self) -> (usize, usize) {
        let now = now_unix_seconds();
        let revocations = self
            .revocations
            .purge_expired(now, self.config.max_token_lifetime_seconds);
        let sessions = self.sessions.purge_expired(now);
        (revocations, sessions)
    }

    #[must_use]
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

/// Background sweep keeping the revocation set and session store bounded.
pub fn spawn_purge_worker(guard: Arc<SessionGuard>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let interval = guard.config().purge_interval();
        loop {
            sleep(interval).await;
            let (revocations, sessions) = guard.purge_expired();
            if revocations > 0 || sessions > 0 {
                debug!(revocations, sessions, "purged expired guard entries");
            }
        }
    })
}
