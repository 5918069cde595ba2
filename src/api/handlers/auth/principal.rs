//! Request-decorating guard for downstream portal handlers.
//!
//! Route handlers call [`require_auth`] with the incoming headers and either
//! get an identity context to act on or a typed failure that maps straight
//! to a 401 with its reason code.

use axum::http::HeaderMap;

use super::state::AuthState;
use super::utils::{extract_bearer_token, request_origin};
use crate::error::AuthFailure;
use crate::identity::types::IdentityContext;

/// Resolve the request's bearer token to an identity context.
///
/// # Errors
/// One [`AuthFailure`] per rejection state; render with
/// [`super::types::failure_response`].
pub fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<IdentityContext, AuthFailure> {
    let origin = request_origin(headers);
    let token = extract_bearer_token(headers);
    state.guard().authorize(token.as_deref(), &origin)
}
