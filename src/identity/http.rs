//! Reqwest implementation of the identity provider contract.
//!
//! JSON over HTTPS, one function per provider operation, each wrapped in a
//! span carrying the method and URL. Unexpected response shapes are never
//! interpreted; they resolve to `ProviderUnavailable` so callers treat the
//! outcome as unknown. Transport rides on the [`ResilientClient`]: challenge
//! issuance, exchange, and refresh are not safe to re-submit, revocation is.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::error::{classify_provider_error, classify_refresh_error, ProviderErrorBody};
use super::types::{IdentityContext, Purpose, Role, Session};
use super::{DependencyStatus, IdentityBackend};
use crate::client::{ClientError, Idempotency, ResilientClient};
use crate::error::AuthError;

/// Hosted identity provider reached over HTTPS.
pub struct HttpIdentityBackend {
    transport: Arc<ResilientClient>,
    base_url: String,
    fallback_cooldown: Duration,
}

impl HttpIdentityBackend {
    #[must_use]
    pub fn new(transport: Arc<ResilientClient>, base_url: &str, fallback_cooldown: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            fallback_cooldown,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Read a provider rejection body and classify it, treating unreadable
    /// bodies and server errors as transient.
    async fn rejection(
        &self,
        response: reqwest::Response,
        refresh_path: bool,
    ) -> AuthError {
        let status = response.status();
        if status.is_server_error() {
            return AuthError::unavailable(format!("provider error: {status}"));
        }
        match response.json::<ProviderErrorBody>().await {
            Ok(body) => {
                if refresh_path {
                    classify_refresh_error(&body)
                } else {
                    classify_provider_error(&body, self.fallback_cooldown)
                }
            }
            Err(err) => {
                AuthError::unavailable(format!("provider answered {status} with unreadable body: {err}"))
            }
        }
    }
}

#[async_trait]
impl IdentityBackend for HttpIdentityBackend {
    async fn issue_challenge(&self, email: &str, purpose: Purpose) -> Result<(), AuthError> {
        let url = self.endpoint("/v1/challenge");
        let policy = self.transport.policy(Idempotency::NotSafeToRetry);

        let span = info_span!(
            "identity.issue_challenge",
            http.method = "POST",
            url = %url
        );
        async {
            let response = self
                .transport
                .send(
                    || {
                        self.transport
                            .http()
                            .post(&url)
                            .json(&json!({ "email": email, "purpose": purpose }))
                    },
                    &policy,
                )
                .await
                .map_err(map_client_error)?;

            if response.status().is_success() {
                Ok(())
            } else {
                Err(self.rejection(response, false).await)
            }
        }
        .instrument(span)
        .await
    }

    async fn verify_challenge(
        &self,
        email: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<Session, AuthError> {
        let url = self.endpoint("/v1/verify");
        let policy = self.transport.policy(Idempotency::NotSafeToRetry);

        let span = info_span!(
            "identity.verify_challenge",
            http.method = "POST",
            url = %url
        );
        async {
            let response = self
                .transport
                .send(
                    || {
                        self.transport.http().post(&url).json(&json!({
                            "email": email,
                            "purpose": purpose,
                            "code": code,
                        }))
                    },
                    &policy,
                )
                .await
                .map_err(map_client_error)?;

            if response.status().is_success() {
                parse_session(response).await
            } else {
                Err(self.rejection(response, false).await)
            }
        }
        .instrument(span)
        .await
    }

    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError> {
        let url = self.endpoint("/v1/refresh");
        let policy = self.transport.policy(Idempotency::NotSafeToRetry);

        let span = info_span!(
            "identity.refresh_session",
            http.method = "POST",
            url = %url
        );
        async {
            let response = self
                .transport
                .send(
                    || {
                        self.transport
                            .http()
                            .post(&url)
                            .json(&json!({ "refresh_token": refresh_token }))
                    },
                    &policy,
                )
                .await
                .map_err(map_client_error)?;

            if response.status().is_success() {
                parse_session(response).await
            } else {
                Err(self.rejection(response, true).await)
            }
        }
        .instrument(span)
        .await
    }

    async fn revoke(&self, token_signature: &str) -> Result<(), AuthError> {
        let url = self.endpoint("/v1/revoke");
        // Revocation is idempotent provider-side, so 5xx responses retry.
        let policy = self.transport.policy(Idempotency::SafeToRetry);

        let span = info_span!(
            "identity.revoke",
            http.method = "POST",
            url = %url
        );
        async {
            let response = self
                .transport
                .send(
                    || {
                        self.transport
                            .http()
                            .post(&url)
                            .json(&json!({ "token_signature": token_signature }))
                    },
                    &policy,
                )
                .await
                .map_err(map_client_error)?;

            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(AuthError::unavailable(format!(
                    "provider rejected revocation: {status}"
                )))
            }
        }
        .instrument(span)
        .await
    }

    async fn status(&self) -> DependencyStatus {
        let url = self.endpoint("/health");
        let policy = self
            .transport
            .policy(Idempotency::SafeToRetry)
            .with_retries(0)
            .with_timeout(Duration::from_secs(3));

        match self
            .transport
            .send(|| self.transport.http().get(&url), &policy)
            .await
        {
            Ok(response) if response.status().is_success() => DependencyStatus::Ok,
            Ok(response) => {
                warn!(status = %response.status(), "identity provider health check failed");
                DependencyStatus::Error
            }
            Err(err) => {
                warn!(error = %err, "identity provider unreachable");
                DependencyStatus::Error
            }
        }
    }
}

/// Session shape every minting endpoint returns. All fields are required;
/// anything less is a malformed success and is never accepted.
#[derive(Deserialize)]
struct WireSession {
    access_token: String,
    refresh_token: String,
    identity_id: Uuid,
    email: String,
    role: Role,
    issued_at: i64,
    expires_at: i64,
}

async fn parse_session(response: reqwest::Response) -> Result<Session, AuthError> {
    let wire: WireSession = response
        .json()
        .await
        .map_err(|err| AuthError::unavailable(format!("malformed session response: {err}")))?;

    let session = Session {
        access_token: wire.access_token,
        refresh_token: wire.refresh_token,
        issued_at: wire.issued_at,
        expires_at: wire.expires_at,
        identity: IdentityContext {
            identity_id: wire.identity_id,
            email: wire.email,
            role: wire.role,
        },
    };
    if session.is_well_formed() {
        Ok(session)
    } else {
        Err(AuthError::unavailable(
            "malformed session response: empty token or inverted lifetime",
        ))
    }
}

fn map_client_error(err: ClientError) -> AuthError {
    AuthError::unavailable(err.to_string())
}
