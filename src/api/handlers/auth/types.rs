//! Request/response types for auth endpoints and their error mapping.

use axum::{
    http::{header::RETRY_AFTER, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AuthError, AuthFailure};
use crate::identity::types::{Purpose, Role, Session};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChallengeRequest {
    pub email: String,
    pub purpose: Purpose,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ExchangeRequest {
    pub email: String,
    pub purpose: Purpose,
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub identity_id: String,
    pub email: String,
    pub role: Role,
    pub issued_at: i64,
    pub expires_at: i64,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            access_token: session.access_token.clone(),
            refresh_token: session.refresh_token.clone(),
            identity_id: session.identity.identity_id.to_string(),
            email: session.identity.email.clone(),
            role: session.identity.role,
            issued_at: session.issued_at,
            expires_at: session.expires_at,
        }
    }
}

/// Identity context returned by the session introspection endpoint.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SessionInfoResponse {
    pub identity_id: String,
    pub email: String,
    pub role: Role,
}

/// Machine-readable error body shared by every auth endpoint. `error` is a
/// stable code; `message` carries the user-facing remediation.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts_remaining: Option<u32>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            message: message.into(),
            retry_after_seconds: None,
            attempts_remaining: None,
        }
    }
}

/// Map a protocol error to its HTTP response.
///
/// Rate limits carry a `Retry-After` header; wrong codes carry the
/// remaining attempt budget so the portal can render "n attempts left".
pub fn auth_error_response(err: &AuthError) -> Response {
    let status = match err {
        AuthError::InvalidEmail | AuthError::CodeInvalid { .. } | AuthError::CodeExpired => {
            StatusCode::BAD_REQUEST
        }
        AuthError::AlreadyConsumed => StatusCode::CONFLICT,
        AuthError::AttemptsExhausted | AuthError::RateLimited { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        AuthError::RefreshInvalid | AuthError::RefreshExpired => StatusCode::UNAUTHORIZED,
        AuthError::ProviderUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };

    let mut body = ErrorBody::new(err.code(), err.to_string());
    let mut headers = HeaderMap::new();
    match err {
        AuthError::RateLimited { retry_after } => {
            let seconds = retry_after.as_secs();
            body.retry_after_seconds = Some(seconds);
            if let Ok(value) = HeaderValue::from_str(&seconds.to_string()) {
                headers.insert(RETRY_AFTER, value);
            }
        }
        AuthError::CodeInvalid { attempts_remaining } => {
            body.attempts_remaining = *attempts_remaining;
        }
        _ => {}
    }

    (status, headers, Json(body)).into_response()
}

/// Guard rejections always resolve to 401 with the reason code.
pub fn failure_response(failure: AuthFailure) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorBody::new(failure.reason_code(), failure.to_string())),
    )
        .into_response()
}

pub fn missing_payload_response() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody::new("invalid_request", "Missing payload")),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::types::IdentityContext;
    use anyhow::Result;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn challenge_request_round_trips() -> Result<()> {
        let request = ChallengeRequest {
            email: "alice@example.com".to_string(),
            purpose: Purpose::Login,
        };
        let value = serde_json::to_value(&request)?;
        assert_eq!(
            value.get("purpose").and_then(serde_json::Value::as_str),
            Some("login")
        );
        let decoded: ChallengeRequest = serde_json::from_value(value)?;
        assert_eq!(decoded.email, "alice@example.com");
        Ok(())
    }

    #[test]
    fn session_response_flattens_identity() {
        let session = Session {
            access_token: "access-token-00000000000".to_string(),
            refresh_token: "refresh-token-0000000000".to_string(),
            issued_at: 100,
            expires_at: 200,
            identity: IdentityContext {
                identity_id: Uuid::nil(),
                email: "bob@example.com".to_string(),
                role: Role::Staff,
            },
        };
        let response = SessionResponse::from(&session);
        assert_eq!(response.identity_id, Uuid::nil().to_string());
        assert_eq!(response.email, "bob@example.com");
        assert_eq!(response.role, Role::Staff);
    }

    #[test]
    fn rate_limit_response_carries_retry_after() {
        let response = auth_error_response(&AuthError::RateLimited {
            retry_after: Duration::from_secs(30),
        });
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok()),
            Some("30")
        );
    }

    #[test]
    fn error_statuses_follow_the_taxonomy() {
        assert_eq!(
            auth_error_response(&AuthError::InvalidEmail).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            auth_error_response(&AuthError::AlreadyConsumed).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            auth_error_response(&AuthError::AttemptsExhausted).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            auth_error_response(&AuthError::RefreshInvalid).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            auth_error_response(&AuthError::unavailable("down")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn failure_response_is_401() {
        let response = failure_response(AuthFailure::Revoked);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
