use utoipa::OpenApi;

use super::handlers::{auth, health};

/// `OpenAPI` document for the auth surface; served by Swagger UI and the
/// `/api-docs/openapi.json` route.
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::challenge::request_challenge,
        auth::exchange::exchange_code,
        auth::session::session,
        auth::session::refresh,
        auth::session::revoke,
    ),
    components(schemas(
        health::Health,
        auth::types::ChallengeRequest,
        auth::types::ExchangeRequest,
        auth::types::RefreshRequest,
        auth::types::SessionResponse,
        auth::types::SessionInfoResponse,
        auth::types::ErrorBody,
        crate::identity::types::Purpose,
        crate::identity::types::Role,
    )),
    tags(
        (name = "auth", description = "One-time code sign-in and session lifecycle"),
        (name = "health", description = "Service and dependency health"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_info_from_cargo() {
        let spec = ApiDoc::openapi();
        assert_eq!(spec.info.title, env!("CARGO_PKG_NAME"));
        assert_eq!(spec.info.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn openapi_covers_the_auth_surface() {
        let spec = ApiDoc::openapi();
        for path in [
            "/health",
            "/v1/auth/challenge",
            "/v1/auth/exchange",
            "/v1/auth/session",
            "/v1/auth/refresh",
            "/v1/auth/revoke",
        ] {
            assert!(
                spec.paths.paths.contains_key(path),
                "missing path: {path}"
            );
        }
    }
}
