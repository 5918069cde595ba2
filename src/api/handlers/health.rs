use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

use super::auth::AuthState;
use crate::api::GIT_COMMIT_HASH;
use crate::identity::DependencyStatus;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    identity_backend: String,
}

#[utoipa::path(
    get,
    path = "/health",
    responses (
        (status = 200, description = "Identity backend dependency is healthy", body = [Health]),
        (status = 503, description = "Identity backend dependency is unhealthy", body = [Health])
    ),
    tag = "health"
)]
// axum handler for health
pub async fn health(method: Method, state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    let backend_status = state.backend().status().await;
    let is_healthy = backend_status.is_healthy();

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        identity_backend: backend_status.as_str().to_string(),
    };

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let short_hash = if health.commit.len() > 7 {
        &health.commit[0..7]
    } else {
        ""
    };

    let headers = format!("{}:{}:{}", health.name, health.version, short_hash)
        .parse::<HeaderValue>()
        .map(|x_app_header_value| {
            let mut headers = HeaderMap::new();
            headers.insert("X-App", x_app_header_value);
            headers
        })
        .map_err(|err| {
            error!("Failed to parse X-App header: {}", err);
        });
    let headers = headers.unwrap_or_else(|()| HeaderMap::new());

    match backend_status {
        DependencyStatus::Ok => debug!("Identity backend is healthy"),
        DependencyStatus::Error => debug!("Identity backend is unhealthy"),
        DependencyStatus::Embedded => debug!("Identity backend is embedded"),
    }

    if is_healthy {
        (StatusCode::OK, headers, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::auth::AuthConfig;
    use crate::guard::audit::{spawn_audit_writer, TracingAuditSink};
    use crate::identity::{InMemoryConfig, InMemoryIdentityBackend};

    #[tokio::test]
    async fn embedded_backend_reports_healthy() {
        let backend = Arc::new(InMemoryIdentityBackend::new(InMemoryConfig::new()));
        let (audit, _worker) = spawn_audit_writer(Arc::new(TracingAuditSink));
        let state = Extension(Arc::new(AuthState::new(AuthConfig::new(), backend, audit)));

        let response = health(Method::GET, state).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-App"));
    }
}
