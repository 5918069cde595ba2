//! In-process identity backend for local development and tests.
//!
//! Implements the same observable behavior as the hosted provider: one
//! outstanding challenge per (email, purpose) with supersession, a bounded
//! attempt budget that burns down monotonically, consume-exactly-once
//! semantics, issuance cooldown, and single-use refresh token rotation.
//! Codes are "delivered" by logging them, the same way the portal logs
//! outbound email in local dev.

use async_trait::async_trait;
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{rngs::OsRng, Rng, RngCore};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use super::types::{now_unix_seconds, IdentityContext, Purpose, Role, Session};
use super::{DependencyStatus, IdentityBackend};
use crate::error::AuthError;

const DEFAULT_CHALLENGE_COOLDOWN_SECONDS: i64 = 60;
const DEFAULT_CODE_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_ACCESS_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TTL_SECONDS: i64 = 14 * 24 * 60 * 60;

/// Tunables mirroring the hosted provider's throttle and lifetimes.
#[derive(Clone, Copy, Debug)]
pub struct InMemoryConfig {
    challenge_cooldown_seconds: i64,
    code_ttl_seconds: i64,
    max_attempts: u32,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl InMemoryConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            challenge_cooldown_seconds: DEFAULT_CHALLENGE_COOLDOWN_SECONDS,
            code_ttl_seconds: DEFAULT_CODE_TTL_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            access_ttl_seconds: DEFAULT_ACCESS_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_challenge_cooldown_seconds(mut self, seconds: i64) -> Self {
        self.challenge_cooldown_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_code_ttl_seconds(mut self, seconds: i64) -> Self {
        self.code_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl_seconds = seconds;
        self
    }
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

struct ChallengeRecord {
    code: String,
    expires_at: i64,
    attempts_remaining: u32,
    consumed: bool,
}

struct RefreshRecord {
    identity: IdentityContext,
    expires_at: i64,
}

#[derive(Default)]
struct ProviderState {
    identities: HashMap<String, IdentityContext>,
    challenges: HashMap<(String, Purpose), ChallengeRecord>,
    last_issue: HashMap<(String, Purpose), i64>,
    refresh_tokens: HashMap<String, RefreshRecord>,
    revoked_signatures: HashSet<String>,
}

/// Embedded identity backend; the account store lives in a mutex-guarded map.
pub struct InMemoryIdentityBackend {
    config: InMemoryConfig,
    state: Mutex<ProviderState>,
}

impl InMemoryIdentityBackend {
    #[must_use]
    pub fn new(config: InMemoryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(ProviderState::default()),
        }
    }

    /// Pre-register an identity with a role other than the default.
    pub fn register_identity(&self, email: &str, role: Role) -> Uuid {
        let identity_id = Uuid::new_v4();
        if let Ok(mut state) = self.state.lock() {
            state.identities.insert(
                email.to_string(),
                IdentityContext {
                    identity_id,
                    email: email.to_string(),
                    role,
                },
            );
        }
        identity_id
    }

    /// Last code issued for the pair. Local-dev hook; the hosted provider
    /// delivers codes out of band instead.
    #[must_use]
    pub fn issued_code(&self, email: &str, purpose: Purpose) -> Option<String> {
        self.state.lock().ok().and_then(|state| {
            state
                .challenges
                .get(&(email.to_string(), purpose))
                .filter(|record| !record.consumed)
                .map(|record| record.code.clone())
        })
    }

    /// Whether a token signature was reported revoked.
    #[must_use]
    pub fn is_revoked(&self, token_signature: &str) -> bool {
        self.state
            .lock()
            .map(|state| state.revoked_signatures.contains(token_signature))
            .unwrap_or(false)
    }

    fn mint_session(state: &mut ProviderState, identity: IdentityContext, config: &InMemoryConfig) -> Session {
        let now = now_unix_seconds();
        let session = Session {
            access_token: generate_token(),
            refresh_token: generate_token(),
            issued_at: now,
            expires_at: now.saturating_add(config.access_ttl_seconds),
            identity: identity.clone(),
        };
        state.refresh_tokens.insert(
            session.refresh_token.clone(),
            RefreshRecord {
                identity,
                expires_at: now.saturating_add(config.refresh_ttl_seconds),
            },
        );
        session
    }
}

#[async_trait]
impl IdentityBackend for InMemoryIdentityBackend {
    async fn issue_challenge(&self, email: &str, purpose: Purpose) -> Result<(), AuthError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::unavailable("identity state poisoned"))?;

        let now = now_unix_seconds();
        let key = (email.to_string(), purpose);

        if let Some(last) = state.last_issue.get(&key) {
            let elapsed = now.saturating_sub(*last);
            if elapsed < self.config.challenge_cooldown_seconds {
                let remaining = self.config.challenge_cooldown_seconds - elapsed;
                return Err(AuthError::RateLimited {
                    retry_after: Duration::from_secs(u64::try_from(remaining).unwrap_or(0)),
                });
            }
        }

        let code = generate_code();
        info!(
            email = %email,
            purpose = purpose.as_str(),
            code = %code,
            "one-time code issued (embedded backend, delivery stub)"
        );

        // Overwriting supersedes any prior unconsumed challenge for the pair.
        state.challenges.insert(
            key.clone(),
            ChallengeRecord {
                code,
                expires_at: now.saturating_add(self.config.code_ttl_seconds),
                attempts_remaining: self.config.max_attempts,
                consumed: false,
            },
        );
        state.last_issue.insert(key, now);
        Ok(())
    }

    async fn verify_challenge(
        &self,
        email: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<Session, AuthError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::unavailable("identity state poisoned"))?;

        let now = now_unix_seconds();
        let key = (email.to_string(), purpose);

        {
            let Some(record) = state.challenges.get_mut(&key) else {
                return Err(AuthError::CodeInvalid {
                    attempts_remaining: None,
                });
            };

            if record.consumed {
                if record.attempts_remaining == 0 {
                    return Err(AuthError::AttemptsExhausted);
                }
                return Err(AuthError::AlreadyConsumed);
            }
            if now > record.expires_at {
                return Err(AuthError::CodeExpired);
            }
            if record.code != code {
                record.attempts_remaining = record.attempts_remaining.saturating_sub(1);
                if record.attempts_remaining == 0 {
                    // Attempt budget spent: the challenge flips consumed and
                    // stays dead even for a later correct code.
                    record.consumed = true;
                    return Err(AuthError::AttemptsExhausted);
                }
                return Err(AuthError::CodeInvalid {
                    attempts_remaining: Some(record.attempts_remaining),
                });
            }

            record.consumed = true;
        }

        let identity = state
            .identities
            .entry(email.to_string())
            .or_insert_with(|| IdentityContext {
                identity_id: Uuid::new_v4(),
                email: email.to_string(),
                role: Role::Patient,
            })
            .clone();

        Ok(Self::mint_session(&mut state, identity, &self.config))
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::unavailable("identity state poisoned"))?;

        // Removal makes the chain single-use: a replayed refresh token is
        // gone from the map and fails RefreshInvalid.
        let Some(record) = state.refresh_tokens.remove(refresh_token) else {
            return Err(AuthError::RefreshInvalid);
        };
        if now_unix_seconds() > record.expires_at {
            return Err(AuthError::RefreshExpired);
        }

        Ok(Self::mint_session(&mut state, record.identity, &self.config))
    }

    async fn revoke(&self, token_signature: &str) -> Result<(), AuthError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| AuthError::unavailable("identity state poisoned"))?;
        state.revoked_signatures.insert(token_signature.to_string());
        Ok(())
    }

    async fn status(&self) -> DependencyStatus {
        DependencyStatus::Embedded
    }
}

/// Exactly six ASCII digits, the provider's code contract.
fn generate_code() -> String {
    let value: u32 = OsRng.gen_range(0..1_000_000);
    format!("{value:06}")
}

fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Base64UrlUnpadded::encode_string(&bytes)
}
