//! Identity backend: the external system of record for accounts, one-time
//! code delivery, and token issuance.
//!
//! Flow Overview: the coordinator and exchanger talk to an [`IdentityBackend`]
//! and never interpret provider wire shapes themselves. Two implementations
//! exist: [`HttpIdentityBackend`] for the hosted provider (JSON over HTTPS)
//! and [`InMemoryIdentityBackend`] for local development and tests, which
//! implements the same challenge/session state machine in process.

mod error;
mod http;
mod memory;
pub mod types;

pub use http::HttpIdentityBackend;
pub use memory::{InMemoryConfig, InMemoryIdentityBackend};

use async_trait::async_trait;

use crate::error::AuthError;
use types::{Purpose, Session};

/// Provider operations consumed by this subsystem.
///
/// All calls are request/response; every failure is already classified into
/// the closed [`AuthError`] taxonomy by the implementation.
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    /// Ask the provider to mint and deliver a one-time code.
    ///
    /// Issuing supersedes any prior unconsumed challenge for the same
    /// `(email, purpose)` pair; the provider is the system of record for
    /// challenge validity.
    async fn issue_challenge(&self, email: &str, purpose: Purpose) -> Result<(), AuthError>;

    /// Exchange a user-entered code for a signed session.
    async fn verify_challenge(
        &self,
        email: &str,
        purpose: Purpose,
        code: &str,
    ) -> Result<Session, AuthError>;

    /// Mint a new session from a refresh token. Each successful call
    /// invalidates the token that was used (single-use refresh chain).
    async fn refresh_session(&self, refresh_token: &str) -> Result<Session, AuthError>;

    /// Report a token signature as revoked. Idempotent provider-side.
    async fn revoke(&self, token_signature: &str) -> Result<(), AuthError>;

    /// Reachability of the backing provider, reported by `/health`.
    async fn status(&self) -> DependencyStatus;
}

/// Health of the identity backend dependency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    /// Remote provider is reachable.
    Ok,
    /// Remote provider is unreachable or misbehaving.
    Error,
    /// The embedded in-process backend; no external dependency.
    Embedded,
}

impl DependencyStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
            Self::Embedded => "embedded",
        }
    }

    #[must_use]
    pub const fn is_healthy(self) -> bool {
        !matches!(self, Self::Error)
    }
}
