//! Revocation set for tokens invalidated before their natural expiry.
//!
//! Keyed by token signature for an O(1) membership check on the authorize
//! hot path. Entries outlive their usefulness once the revoked token would
//! have expired anyway, so a periodic purge keeps the set bounded. The store
//! is an explicitly injected, lifecycle-scoped value, not a module-level
//! singleton, so every test can run against an isolated instance.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared revocation set; clones observe the same entries.
#[derive(Clone, Debug, Default)]
pub struct RevocationStore {
    inner: Arc<Mutex<HashMap<String, i64>>>,
}

impl RevocationStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a revocation. Idempotent: re-revoking keeps the earliest
    /// `revoked_at` so the purge horizon never moves backwards.
    pub fn revoke(&self, token_signature: &str, revoked_at: i64) {
        if let Ok(mut entries) = self.inner.lock() {
            entries
                .entry(token_signature.to_string())
                .and_modify(|existing| {
                    if revoked_at < *existing {
                        *existing = revoked_at;
                    }
                })
                .or_insert(revoked_at);
        }
    }

    #[must_use]
    pub fn contains(&self, token_signature: &str) -> bool {
        self.inner
            .lock()
            .map(|entries| entries.contains_key(token_signature))
            .unwrap_or(false)
    }

    /// Drop entries whose token would have expired on its own by `now`.
    /// Returns how many entries were removed.
    pub fn purge_expired(&self, now: i64, max_token_lifetime_seconds: i64) -> usize {
        let Ok(mut entries) = self.inner.lock() else {
            return 0;
        };
        let before = entries.len();
        entries.retain(|_, revoked_at| {
            revoked_at.saturating_add(max_token_lifetime_seconds) >= now
        });
        before - entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
