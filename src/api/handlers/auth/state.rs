//! Auth state and configuration shared across handlers.

use std::sync::Arc;

use crate::guard::audit::AuditHandle;
use crate::guard::revocation::RevocationStore;
use crate::guard::store::SessionStore;
use crate::guard::{GuardConfig, SessionGuard};
use crate::identity::IdentityBackend;
use crate::otp::{ChallengeCoordinator, TokenExchanger};

const DEFAULT_CHALLENGE_COOLDOWN_SECONDS: i64 = 60;
const DEFAULT_MAX_VERIFICATION_ATTEMPTS: u32 = 3;
const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;
const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_BACKOFF_BASE_MS: u64 = 250;
const DEFAULT_BACKOFF_CAP_MS: u64 = 5_000;
const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_PORTAL_ORIGIN: &str = "http://localhost:3000";

/// Externally configurable knobs; none are hard-coded into protocol logic.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    portal_origin: String,
    challenge_cooldown_seconds: i64,
    max_verification_attempts: u32,
    access_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    retry_count: u32,
    backoff_base_ms: u64,
    backoff_cap_ms: u64,
    request_timeout_seconds: u64,
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            portal_origin: DEFAULT_PORTAL_ORIGIN.to_string(),
            challenge_cooldown_seconds: DEFAULT_CHALLENGE_COOLDOWN_SECONDS,
            max_verification_attempts: DEFAULT_MAX_VERIFICATION_ATTEMPTS,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            retry_count: DEFAULT_RETRY_COUNT,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
            backoff_cap_ms: DEFAULT_BACKOFF_CAP_MS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }

    #[must_use]
    pub fn with_portal_origin(mut self, origin: String) -> Self {
        self.portal_origin = origin;
        self
    }

    #[must_use]
    pub fn with_challenge_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.challenge_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_verification_attempts(mut self, attempts: u32) -> Self {
        self.max_verification_attempts = attempts;
        self
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_retry_count(mut self, retries: u32) -> Self {
        self.retry_count = retries;
        self
    }

    #[must_use]
    pub fn with_backoff_base_ms(mut self, millis: u64) -> Self {
        self.backoff_base_ms = millis;
        self
    }

    #[must_use]
    pub fn with_backoff_cap_ms(mut self, millis: u64) -> Self {
        self.backoff_cap_ms = millis;
        self
    }

    #[must_use]
    pub fn with_request_timeout_seconds(mut self, seconds: u64) -> Self {
        self.request_timeout_seconds = seconds;
        self
    }

    #[must_use]
    pub fn portal_origin(&self) -> &str {
        &self.portal_origin
    }

    #[must_use]
    pub fn challenge_cooldown_seconds(&self) -> i64 {
        self.challenge_cooldown_seconds
    }

    #[must_use]
    pub fn max_verification_attempts(&self) -> u32 {
        self.max_verification_attempts
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    #[must_use]
    pub fn backoff_base_ms(&self) -> u64 {
        self.backoff_base_ms
    }

    #[must_use]
    pub fn backoff_cap_ms(&self) -> u64 {
        self.backoff_cap_ms
    }

    #[must_use]
    pub fn request_timeout_seconds(&self) -> u64 {
        self.request_timeout_seconds
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the auth handlers need, wired once at startup and injected
/// as an extension. The guard's stores live here, scoped to this state,
/// so isolated instances per test case come for free.
pub struct AuthState {
    config: AuthConfig,
    coordinator: ChallengeCoordinator,
    exchanger: TokenExchanger,
    guard: Arc<SessionGuard>,
    backend: Arc<dyn IdentityBackend>,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, backend: Arc<dyn IdentityBackend>, audit: AuditHandle) -> Self {
        let sessions = SessionStore::new();
        let revocations = RevocationStore::new();
        let guard = Arc::new(SessionGuard::new(
            backend.clone(),
            sessions.clone(),
            revocations,
            audit.clone(),
            GuardConfig::new()
                .with_max_token_lifetime_seconds(config.access_token_ttl_seconds()),
        ));
        let coordinator = ChallengeCoordinator::new(backend.clone(), audit.clone());
        let exchanger = TokenExchanger::new(backend.clone(), sessions, audit);
        Self {
            config,
            coordinator,
            exchanger,
            guard,
            backend,
        }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn coordinator(&self) -> &ChallengeCoordinator {
        &self.coordinator
    }

    #[must_use]
    pub fn exchanger(&self) -> &TokenExchanger {
        &self.exchanger
    }

    #[must_use]
    pub fn guard(&self) -> &Arc<SessionGuard> {
        &self.guard
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn IdentityBackend> {
        &self.backend
    }
}
