//! Session endpoints: introspection, refresh, revocation.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use super::principal::require_auth;
use super::state::AuthState;
use super::types::{
    auth_error_response, failure_response, missing_payload_response, ErrorBody, RefreshRequest,
    SessionInfoResponse, SessionResponse,
};
use super::utils::{extract_bearer_token, request_origin};
use crate::error::AuthFailure;

/// Introspect the presented bearer token.
#[utoipa::path(
    get,
    path = "/v1/auth/session",
    responses(
        (status = 200, description = "Session is active", body = SessionInfoResponse),
        (status = 401, description = "Rejected; error field carries the reason code", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn session(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    match require_auth(&headers, &state) {
        Ok(identity) => (
            StatusCode::OK,
            Json(SessionInfoResponse {
                identity_id: identity.identity_id.to_string(),
                email: identity.email,
                role: identity.role,
            }),
        )
            .into_response(),
        Err(failure) => failure_response(failure),
    }
}

/// Mint a new session from a refresh token. Single-use: the presented
/// refresh token is invalidated by a successful rotation.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session rotated", body = SessionResponse),
        (status = 401, description = "Refresh token invalid or expired", body = ErrorBody),
        (status = 503, description = "Identity provider unavailable", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshRequest>>,
) -> Response {
    let Some(Json(request)) = payload else {
        return missing_payload_response();
    };

    let origin = request_origin(&headers);
    match state.guard().refresh(&request.refresh_token, &origin).await {
        Ok(session) => (StatusCode::OK, Json(SessionResponse::from(&session))).into_response(),
        Err(err) => auth_error_response(&err),
    }
}

/// Revoke the presented access token before its natural expiry. Idempotent.
#[utoipa::path(
    post,
    path = "/v1/auth/revoke",
    responses(
        (status = 204, description = "Token revoked (or already was)"),
        (status = 401, description = "No usable bearer token", body = ErrorBody)
    ),
    tag = "auth"
)]
pub async fn revoke(headers: HeaderMap, state: Extension<Arc<AuthState>>) -> Response {
    let Some(token) = extract_bearer_token(&headers) else {
        return failure_response(AuthFailure::NoToken);
    };

    let origin = request_origin(&headers);
    state.guard().revoke(&token, &origin).await;
    StatusCode::NO_CONTENT.into_response()
}
