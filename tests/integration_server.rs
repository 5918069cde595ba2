//! Integration tests for the ensaluto auth service.
//!
//! This suite verifies the full HTTP surface by:
//! 1. Wiring the router against the embedded identity backend.
//! 2. Serving it on an ephemeral localhost port.
//! 3. Executing real HTTP requests through the whole sign-in lifecycle:
//!    challenge, wrong codes, exchange, authorize, refresh, revoke.

use anyhow::{anyhow, Context, Result};
use ensaluto::api::{self, AuthConfig, AuthState};
use ensaluto::guard::audit::{spawn_audit_writer, TracingAuditSink};
use ensaluto::identity::types::Purpose;
use ensaluto::identity::{InMemoryConfig, InMemoryIdentityBackend};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::TcpListener;
use std::sync::Arc;

struct TestServer {
    base_url: String,
    backend: Arc<InMemoryIdentityBackend>,
    _server: tokio::task::JoinHandle<()>,
}

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

async fn start_server() -> Result<TestServer> {
    let backend = Arc::new(InMemoryIdentityBackend::new(
        InMemoryConfig::new().with_challenge_cooldown_seconds(0),
    ));
    let (audit, _audit_worker) = spawn_audit_writer(Arc::new(TracingAuditSink));
    let state = Arc::new(AuthState::new(AuthConfig::new(), backend.clone(), audit));
    let router = api::router(state)?;

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("Failed to bind ephemeral port")?;
    let addr = listener.local_addr()?;
    let server = tokio::spawn(async move {
        let _ = axum::serve(listener, router.into_make_service()).await;
    });

    Ok(TestServer {
        base_url: format!("http://{addr}"),
        backend,
        _server: server,
    })
}

fn wrong_code_for(code: &str) -> &'static str {
    if code == "000000" {
        "111111"
    } else {
        "000000"
    }
}

async fn request_challenge(client: &reqwest::Client, server: &TestServer) -> Result<String> {
    let response = client
        .post(format!("{}/v1/auth/challenge", server.base_url))
        .json(&json!({ "email": "user@example.com", "purpose": "login" }))
        .send()
        .await?;
    if response.status() != StatusCode::NO_CONTENT {
        return Err(anyhow!("challenge request failed: {}", response.status()));
    }
    server
        .backend
        .issued_code("user@example.com", Purpose::Login)
        .context("no code issued")
}

async fn exchange(
    client: &reqwest::Client,
    server: &TestServer,
    code: &str,
) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{}/v1/auth/exchange", server.base_url))
        .json(&json!({
            "email": "user@example.com",
            "purpose": "login",
            "code": code,
        }))
        .send()
        .await?)
}

#[tokio::test]
async fn health_reports_embedded_backend() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/health", server.base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-app"));
    assert!(response.headers().contains_key("x-request-id"));

    let body: Value = response.json().await?;
    assert_eq!(
        body.get("identity_backend").and_then(Value::as_str),
        Some("embedded")
    );
    Ok(())
}

#[tokio::test]
async fn invalid_email_is_rejected_with_code() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/v1/auth/challenge", server.base_url))
        .json(&json!({ "email": "not-an-email", "purpose": "login" }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await?;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("invalid_email")
    );
    Ok(())
}

#[tokio::test]
async fn full_sign_in_lifecycle() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let code = request_challenge(&client, &server).await?;
    let wrong = wrong_code_for(&code);

    // Two wrong submissions burn the attempt budget from 3 down to 1.
    let response = exchange(&client, &server, wrong).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body.get("error").and_then(Value::as_str), Some("code_invalid"));
    assert_eq!(
        body.get("attempts_remaining").and_then(Value::as_u64),
        Some(2)
    );

    let response = exchange(&client, &server, wrong).await?;
    let body: Value = response.json().await?;
    assert_eq!(
        body.get("attempts_remaining").and_then(Value::as_u64),
        Some(1)
    );

    // The correct code still mints a session.
    let response = exchange(&client, &server, &code).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let session: Value = response.json().await?;
    let access_token = session
        .get("access_token")
        .and_then(Value::as_str)
        .context("missing access_token")?
        .to_string();
    let refresh_token = session
        .get("refresh_token")
        .and_then(Value::as_str)
        .context("missing refresh_token")?
        .to_string();
    let issued_at = session
        .get("issued_at")
        .and_then(Value::as_i64)
        .context("missing issued_at")?;
    let expires_at = session
        .get("expires_at")
        .and_then(Value::as_i64)
        .context("missing expires_at")?;
    assert!(expires_at > issued_at);

    // The replayed code never yields a second session.
    let response = exchange(&client, &server, &code).await?;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await?;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("already_consumed")
    );

    // The minted access token authorizes.
    let response = client
        .get(format!("{}/v1/auth/session", server.base_url))
        .bearer_auth(&access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(
        body.get("email").and_then(Value::as_str),
        Some("user@example.com")
    );

    // Refresh rotates; the spent refresh token dies.
    let response = client
        .post(format!("{}/v1/auth/refresh", server.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let rotated: Value = response.json().await?;
    let rotated_refresh = rotated
        .get("refresh_token")
        .and_then(Value::as_str)
        .context("missing rotated refresh_token")?;
    assert_ne!(rotated_refresh, refresh_token);

    let response = client
        .post(format!("{}/v1/auth/refresh", server.base_url))
        .json(&json!({ "refresh_token": refresh_token }))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(
        body.get("error").and_then(Value::as_str),
        Some("refresh_invalid")
    );

    // Revocation wins over the token's remaining lifetime.
    let response = client
        .post(format!("{}/v1/auth/revoke", server.base_url))
        .bearer_auth(&access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = client
        .get(format!("{}/v1/auth/session", server.base_url))
        .bearer_auth(&access_token)
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body.get("error").and_then(Value::as_str), Some("revoked"));
    Ok(())
}

#[tokio::test]
async fn missing_bearer_token_names_the_reason() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/v1/auth/session", server.base_url))
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: Value = response.json().await?;
    assert_eq!(body.get("error").and_then(Value::as_str), Some("no_token"));
    Ok(())
}

#[tokio::test]
async fn reissuing_supersedes_the_prior_challenge() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = start_server().await?;
    let client = reqwest::Client::new();

    let first_code = request_challenge(&client, &server).await?;
    let second_code = request_challenge(&client, &server).await?;

    if first_code != second_code {
        let response = exchange(&client, &server, &first_code).await?;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = exchange(&client, &server, &second_code).await?;
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}
