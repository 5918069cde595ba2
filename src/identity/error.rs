//! Translation of provider error responses into the closed taxonomy.
//!
//! The provider reports failures as a short machine code plus a free-form
//! message. Codes are authoritative; message patterns are only a fallback
//! for older provider deployments that omit the code field. This is the
//! single place where provider error shapes are interpreted; everything
//! else in the crate matches on [`AuthError`] variants.

use std::time::Duration;

use crate::error::AuthError;

/// Error body shape shared by all provider endpoints.
#[derive(Debug, serde::Deserialize)]
pub(super) struct ProviderErrorBody {
    pub error: Option<String>,
    pub message: Option<String>,
    pub retry_after_seconds: Option<u64>,
    pub attempts_remaining: Option<u32>,
}

/// Map a provider rejection into the closed taxonomy.
///
/// `fallback_cooldown` fills in the retry interval when the provider reports
/// `rate_limited` without saying for how long.
pub(super) fn classify_provider_error(
    body: &ProviderErrorBody,
    fallback_cooldown: Duration,
) -> AuthError {
    let code = body.error.as_deref().unwrap_or("");
    let message = body.message.as_deref().unwrap_or("");

    match code {
        "invalid" | "code_invalid" => AuthError::CodeInvalid {
            attempts_remaining: body.attempts_remaining,
        },
        "expired" | "code_expired" => AuthError::CodeExpired,
        "attempts_exhausted" => AuthError::AttemptsExhausted,
        "already_used" | "already_consumed" => AuthError::AlreadyConsumed,
        "rate_limited" => AuthError::RateLimited {
            retry_after: body
                .retry_after_seconds
                .map_or(fallback_cooldown, Duration::from_secs),
        },
        "invalid_email" => AuthError::InvalidEmail,
        _ => classify_by_message(message, body, fallback_cooldown),
    }
}

/// Refresh endpoints reuse `invalid`/`expired` codes but mean the refresh
/// token, not a challenge code; callers on the refresh path use this mapping.
pub(super) fn classify_refresh_error(body: &ProviderErrorBody) -> AuthError {
    let code = body.error.as_deref().unwrap_or("");
    let message = body.message.as_deref().unwrap_or("");
    match code {
        "invalid" | "refresh_invalid" => AuthError::RefreshInvalid,
        "expired" | "refresh_expired" => AuthError::RefreshExpired,
        _ => {
            let lowered = message.to_lowercase();
            if lowered.contains("expired") {
                AuthError::RefreshExpired
            } else if lowered.contains("invalid") || lowered.contains("revoked") {
                AuthError::RefreshInvalid
            } else {
                AuthError::unavailable(format!("unrecognized refresh error: {code} {message}"))
            }
        }
    }
}

fn classify_by_message(
    message: &str,
    body: &ProviderErrorBody,
    fallback_cooldown: Duration,
) -> AuthError {
    let lowered = message.to_lowercase();
    if lowered.contains("already") {
        AuthError::AlreadyConsumed
    } else if lowered.contains("too many") || lowered.contains("exhausted") {
        AuthError::AttemptsExhausted
    } else if lowered.contains("expired") {
        AuthError::CodeExpired
    } else if lowered.contains("rate") || lowered.contains("throttle") {
        AuthError::RateLimited {
            retry_after: body
                .retry_after_seconds
                .map_or(fallback_cooldown, Duration::from_secs),
        }
    } else if lowered.contains("invalid") || lowered.contains("wrong") {
        AuthError::CodeInvalid {
            attempts_remaining: body.attempts_remaining,
        }
    } else {
        // Unknown shapes are transient by definition; the true outcome is
        // unknown and the caller may retry with backoff.
        AuthError::unavailable(format!(
            "unrecognized provider error: {} {}",
            body.error.as_deref().unwrap_or("<none>"),
            message
        ))
    }
}
