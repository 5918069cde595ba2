//! Challenge issuance endpoint.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::state::AuthState;
use super::types::{auth_error_response, missing_payload_response, ChallengeRequest, ErrorBody};
use super::utils::request_origin;

/// Ask the identity provider to deliver a one-time code.
#[utoipa::path(
    post,
    path = "/v1/auth/challenge",
    request_body = ChallengeRequest,
    responses(
        (status = 204, description = "Challenge issued; code delivery is out of band"),
        (status = 400, description = "Invalid email", body = ErrorBody),
        (status = 429, description = "Rate limited; Retry-After carries the wait", body = ErrorBody),
        (status = 503, description = "Identity provider unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn request_challenge(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ChallengeRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload_response();
    };

    let origin = request_origin(&headers);
    match state
        .coordinator()
        .request_challenge(&request.email, request.purpose, &origin)
        .await
    {
        Ok(_receipt) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => auth_error_response(&err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::state::AuthConfig;
    use crate::guard::audit::{spawn_audit_writer, TracingAuditSink};
    use crate::identity::types::Purpose;
    use crate::identity::{InMemoryConfig, InMemoryIdentityBackend};
    use anyhow::Result;

    fn state() -> Extension<Arc<AuthState>> {
        let backend = Arc::new(InMemoryIdentityBackend::new(
            InMemoryConfig::new().with_challenge_cooldown_seconds(0),
        ));
        let (audit, _worker) = spawn_audit_writer(Arc::new(TracingAuditSink));
        Extension(Arc::new(AuthState::new(AuthConfig::new(), backend, audit)))
    }

    #[tokio::test]
    async fn missing_payload_is_bad_request() {
        let response = request_challenge(HeaderMap::new(), state(), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_email_is_bad_request() {
        let response = request_challenge(
            HeaderMap::new(),
            state(),
            Some(Json(ChallengeRequest {
                email: "not-an-email".to_string(),
                purpose: Purpose::Login,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn accepted_challenge_is_no_content() -> Result<()> {
        let response = request_challenge(
            HeaderMap::new(),
            state(),
            Some(Json(ChallengeRequest {
                email: "user@example.com".to_string(),
                purpose: Purpose::Login,
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        Ok(())
    }
}
