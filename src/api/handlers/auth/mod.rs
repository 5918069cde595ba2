//! Auth handlers and supporting modules.
//!
//! This module wires the one-time-code flows and the session guard to the
//! HTTP surface the portal consumes.
//!
//! ## Flow
//!
//! 1) `POST /v1/auth/challenge` asks the identity provider to deliver a
//!    six-digit code for `(email, purpose)`.
//! 2) `POST /v1/auth/exchange` trades the entered code for a session.
//! 3) Protected routes pass through [`principal::require_auth`]; expiring
//!    sessions rotate via `POST /v1/auth/refresh`; sign-out and compromise
//!    handling go through `POST /v1/auth/revoke`.
//!
//! Every decision on these paths appends one audit record through the
//! buffered writer; the response is never blocked on the sink.

pub(crate) mod challenge;
pub(crate) mod exchange;
pub(crate) mod principal;
pub(crate) mod session;
mod state;
pub(crate) mod types;
mod utils;

pub use state::{AuthConfig, AuthState};
