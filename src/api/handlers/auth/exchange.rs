//! Code-for-session exchange endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::state::AuthState;
use super::types::{
    auth_error_response, missing_payload_response, ErrorBody, ExchangeRequest, SessionResponse,
};
use super::utils::request_origin;

/// Exchange a correctly entered code for a session token pair.
#[utoipa::path(
    post,
    path = "/v1/auth/exchange",
    request_body = ExchangeRequest,
    responses(
        (status = 200, description = "Session minted", body = SessionResponse),
        (status = 400, description = "Wrong or expired code", body = ErrorBody),
        (status = 409, description = "Code already used", body = ErrorBody),
        (status = 429, description = "Attempts exhausted", body = ErrorBody),
        (status = 503, description = "Identity provider unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn exchange_code(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ExchangeRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload_response();
    };

    let origin = request_origin(&headers);
    match state
        .exchanger()
        .exchange(&request.email, request.purpose, &request.code, &origin)
        .await
    {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(err) => auth_error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::guard::audit::{spawn_audit_writer, TracingAuditSink};
    use crate::identity::types::Purpose;
    use crate::identity::{IdentityBackend, InMemoryConfig, InMemoryIdentityBackend};
    use anyhow::{Context, Result};

    fn state_with_backend() -> (Extension<Arc<AuthState>>, Arc<InMemoryIdentityBackend>) {
        let backend = Arc::new(InMemoryIdentityBackend::new(
            InMemoryConfig::new().with_challenge_cooldown_seconds(0),
        ));
        let (audit, _worker) = spawn_audit_writer(Arc::new(TracingAuditSink));
        (
            Extension(Arc::new(AuthState::new(
                AuthConfig::new(),
                backend.clone(),
                audit,
            ))),
            backend,
        )
    }

    #[tokio::test]
    async fn missing_payload_is_bad_request() {
        let (state, _backend) = state_with_backend();
        let response = exchange_code(HeaderMap::new(), state, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn malformed_code_is_bad_request() {
        let (state, _backend) = state_with_backend();
        let response = exchange_code(
            HeaderMap::new(),
            state,
            Some(Json(ExchangeRequest {
                email: "user@example.com".to_string(),
                purpose: Purpose::Login,
                code: "12345".to_string(),
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn correct_code_mints_session() -> Result<()> {
        let (state, backend) = state_with_backend();
        backend
            .issue_challenge("user@example.com", Purpose::Login)
            .await?;
        let code = backend
            .issued_code("user@example.com", Purpose::Login)
            .context("no code issued")?;

        let response = exchange_code(
            HeaderMap::new(),
            state,
            Some(Json(ExchangeRequest {
                email: "user@example.com".to_string(),
                purpose: Purpose::Login,
                code,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }

    #[tokio::test]
    async fn replayed_code_conflicts() -> Result<()> {
        let (state, backend) = state_with_backend();
        backend
            .issue_challenge("user@example.com", Purpose::Login)
            .await?;
        let code = backend
            .issued_code("user@example.com", Purpose::Login)
            .context("no code issued")?;

        let request = || {
            Some(Json(ExchangeRequest {
                email: "user@example.com".to_string(),
                purpose: Purpose::Login,
                code: code.clone(),
            }))
        };
        let first = exchange_code(HeaderMap::new(), state.clone(), request()).await;
        assert_eq!(first.status(), StatusCode::OK);

        let second = exchange_code(HeaderMap::new(), state, request()).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);
        Ok(())
    }
}
