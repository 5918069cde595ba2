//! # Ensaluto (One-Time Code Authentication & Session Lifecycle)
//!
//! `ensaluto` is the authentication subsystem of the Klinika portal. It
//! issues short-lived six-digit challenges bound to an email address,
//! exchanges a correctly entered code for a signed session, guards
//! subsequent requests against that session, and drives everything over an
//! unreliable network without duplicating side effects.
//!
//! ## Flow
//!
//! 1. The portal asks the [`otp::ChallengeCoordinator`] for a code; the
//!    identity provider delivers it out of band (email/SMS).
//! 2. The user enters the code; the [`otp::TokenExchanger`] trades it for a
//!    session (access token + single-use-rotating refresh token).
//! 3. Protected routes pass through the [`guard::SessionGuard`], which
//!    checks revocation before anything else and validates the
//!    provider-issued claims tracked in its session store.
//! 4. Callers use the [`client::ResilientClient`] for outbound requests:
//!    bounded exponential backoff for transient failures, per-call
//!    timeouts that abort the transfer, and a single shared in-flight
//!    refresh when concurrent callers hit a 401.
//!
//! ## Security boundaries
//!
//! - The identity provider is the system of record for accounts, challenge
//!   validity, and token issuance; challenge supersession and refresh
//!   rotation are enforced there.
//! - Raw tokens never sit in shared state; the revocation set and session
//!   store are keyed by SHA-256 token signatures.
//! - Every authorize/refresh/revoke/challenge/exchange decision appends one
//!   append-only audit record through a buffered writer that never blocks
//!   the response path.
//!
//! Provider errors are classified once, in `identity::error`, into the
//! closed [`error::AuthError`] taxonomy; retries happen only in the
//! resilient client and only for transient outcomes.

pub mod api;
pub mod cli;
pub mod client;
pub mod error;
pub mod guard;
pub mod identity;
pub mod otp;

pub use api::{APP_USER_AGENT, GIT_COMMIT_HASH};
