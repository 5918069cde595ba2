//! Domain types minted by or shared with the identity backend.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::SystemTime;
use utoipa::ToSchema;
use uuid::Uuid;

/// What the one-time code is for. Each purpose has its own outstanding
/// challenge per email; superseding one purpose leaves the others alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    Login,
    Recovery,
    Confirmation,
}

impl Purpose {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Recovery => "recovery",
            Self::Confirmation => "confirmation",
        }
    }
}

/// Portal role carried in provider-issued claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Patient,
    Staff,
    Admin,
}

/// Authenticated identity attached to requests by the guard.
///
/// Owned by the identity backend; this subsystem references it and never
/// mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityContext {
    pub identity_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// An access/refresh token pair minted by the identity backend.
///
/// Tokens are opaque strings; their validity is tracked through the guard's
/// session store, never re-derived locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub issued_at: i64,
    pub expires_at: i64,
    pub identity: IdentityContext,
}

impl Session {
    /// `issued_at <= expires_at` must always hold; a session violating it is
    /// a malformed provider response, never accepted downstream.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.access_token.is_empty()
            && !self.refresh_token.is_empty()
            && self.issued_at <= self.expires_at
    }
}

/// Unix seconds used for token lifetimes and audit timestamps.
#[must_use]
pub fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Hash a token so raw values never sit in the revocation set or session
/// store. The signature is the lookup key for both.
#[must_use]
pub fn token_signature(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    Base64UrlUnpadded::encode_string(&hasher.finalize())
}

/// Opaque tokens are url-safe base64 without padding and reasonably long.
/// Anything else is rejected as malformed before any lookup happens.
#[must_use]
pub fn well_formed_token(token: &str) -> bool {
    token.len() >= 16
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
