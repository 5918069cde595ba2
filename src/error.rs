//! Closed error taxonomy for the authentication protocol.
//!
//! Flow Overview: the identity provider returns loosely shaped errors; the
//! translation layer in `identity::error` maps them into [`AuthError`] so
//! the rest of the crate (and the portal UI) only ever sees this closed set.
//! Guard rejections are a separate, smaller set ([`AuthFailure`]) because
//! they always resolve to HTTP 401 with a machine-readable reason code.

use std::time::Duration;
use thiserror::Error;

/// Protocol errors for challenge issuance, code exchange, and refresh.
///
/// Variants map one-to-one to the remediation a caller must render:
/// wrong code vs expired code vs locked out vs try again later.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Local validation failure, no network call was made.
    #[error("email address is not valid")]
    InvalidEmail,

    /// The code did not match the outstanding challenge.
    #[error("wrong code{}", attempts_hint(.attempts_remaining))]
    CodeInvalid { attempts_remaining: Option<u32> },

    /// The challenge window elapsed before the code was entered.
    #[error("code expired, request a new one")]
    CodeExpired,

    /// The challenge is permanently dead; a new one must be requested.
    #[error("too many wrong attempts, request a new code")]
    AttemptsExhausted,

    /// The challenge was already consumed by a successful exchange.
    #[error("code already used, request a new one")]
    AlreadyConsumed,

    /// Issuance throttled by the provider; retry after the given interval.
    #[error("rate limited, retry in {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    /// The refresh token was rejected (rotated away or revoked).
    #[error("refresh token is no longer valid")]
    RefreshInvalid,

    /// The refresh token passed its own lifetime; a new sign-in is needed.
    #[error("refresh token expired, sign in again")]
    RefreshExpired,

    /// Network failure, timeout, 5xx, or a malformed provider response.
    /// The operation's true outcome is unknown.
    #[error("identity provider unavailable: {reason}")]
    ProviderUnavailable { reason: String },
}

fn attempts_hint(attempts: &Option<u32>) -> String {
    match attempts {
        Some(n) => format!(", {n} attempts left"),
        None => String::new(),
    }
}

impl AuthError {
    /// Whether a caller may retry the same operation.
    ///
    /// Only transient outcomes retry; a rejected value needs a *new* value,
    /// not a retry, and retrying issuance duplicates side effects.
    #[must_use]
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::ProviderUnavailable { .. }
        )
    }

    /// Stable machine-readable code for JSON error bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "invalid_email",
            Self::CodeInvalid { .. } => "code_invalid",
            Self::CodeExpired => "code_expired",
            Self::AttemptsExhausted => "attempts_exhausted",
            Self::AlreadyConsumed => "already_consumed",
            Self::RateLimited { .. } => "rate_limited",
            Self::RefreshInvalid => "refresh_invalid",
            Self::RefreshExpired => "refresh_expired",
            Self::ProviderUnavailable { .. } => "provider_unavailable",
        }
    }

    /// Shorthand used by transport code when the provider cannot be reached
    /// or answers with an unexpected shape.
    #[must_use]
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            reason: reason.into(),
        }
    }
}

/// Guard rejections for bearer-token authorization.
///
/// Each variant resolves to HTTP 401 with the matching reason code so the
/// portal can distinguish "sign in" from "session ended" from "bad request".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("no bearer token presented")]
    NoToken,

    #[error("bearer token is malformed")]
    Malformed,

    #[error("session expired")]
    Expired,

    #[error("token has been revoked")]
    Revoked,
}

impl AuthFailure {
    /// Stable machine-readable reason code carried in 401 responses.
    #[must_use]
    pub fn reason_code(self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::Revoked => "revoked",
        }
    }
}
