use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{self, AuthConfig, AuthState};
use crate::client::{ClientConfig, ResilientClient};
use crate::guard::audit::{spawn_audit_writer, TracingAuditSink};
use crate::identity::{
    HttpIdentityBackend, IdentityBackend, InMemoryConfig, InMemoryIdentityBackend,
};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub identity_url: Option<String>,
    pub portal_origin: String,
    pub challenge_cooldown_seconds: i64,
    pub max_verification_attempts: u32,
    pub access_token_ttl_seconds: i64,
    pub refresh_token_ttl_seconds: i64,
    pub retry_count: u32,
    pub backoff_base_ms: u64,
    pub backoff_cap_ms: u64,
    pub request_timeout_seconds: u64,
}

/// Execute the server action.
///
/// # Errors
/// Returns an error if the HTTP client cannot be built or the server fails
/// to start.
pub async fn execute(args: Args) -> Result<()> {
    let auth_config = AuthConfig::new()
        .with_portal_origin(args.portal_origin)
        .with_challenge_cooldown_seconds(args.challenge_cooldown_seconds)
        .with_max_verification_attempts(args.max_verification_attempts)
        .with_access_token_ttl_seconds(args.access_token_ttl_seconds)
        .with_refresh_token_ttl_seconds(args.refresh_token_ttl_seconds)
        .with_retry_count(args.retry_count)
        .with_backoff_base_ms(args.backoff_base_ms)
        .with_backoff_cap_ms(args.backoff_cap_ms)
        .with_request_timeout_seconds(args.request_timeout_seconds);

    let (audit, _audit_worker) = spawn_audit_writer(Arc::new(TracingAuditSink));

    let backend: Arc<dyn IdentityBackend> = match &args.identity_url {
        Some(identity_url) => {
            let http = reqwest::Client::builder()
                .user_agent(api::APP_USER_AGENT)
                .build()
                .context("Failed to build identity HTTP client")?;
            let client_config = ClientConfig::new()
                .with_timeout(Duration::from_secs(auth_config.request_timeout_seconds()))
                .with_retries(auth_config.retry_count())
                .with_backoff_base(Duration::from_millis(auth_config.backoff_base_ms()))
                .with_backoff_cap(Duration::from_millis(auth_config.backoff_cap_ms()));
            let transport = Arc::new(ResilientClient::new(http, client_config));
            let cooldown = Duration::from_secs(
                u64::try_from(auth_config.challenge_cooldown_seconds().max(0)).unwrap_or(0),
            );
            info!(identity_url = %identity_url, "using hosted identity provider");
            Arc::new(HttpIdentityBackend::new(transport, identity_url, cooldown))
        }
        None => {
            // Local development only: codes land in the log stream.
            warn!("no identity provider configured; using the embedded backend");
            Arc::new(InMemoryIdentityBackend::new(
                InMemoryConfig::new()
                    .with_challenge_cooldown_seconds(auth_config.challenge_cooldown_seconds())
                    .with_max_attempts(auth_config.max_verification_attempts())
                    .with_access_ttl_seconds(auth_config.access_token_ttl_seconds())
                    .with_refresh_ttl_seconds(auth_config.refresh_token_ttl_seconds()),
            ))
        }
    };

    let state = Arc::new(AuthState::new(auth_config, backend, audit));

    api::serve(args.port, state).await
}
