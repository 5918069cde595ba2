//! Session store backing bearer-token validation.
//!
//! Sessions minted through exchange or refresh are registered here keyed by
//! the access token's signature; `authorize` validates the provider-issued
//! claims (identity, expiry) against this record instead of re-deriving
//! token validity locally. Natural expiry needs no action: an expired record
//! simply stops validating and is eventually purged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::identity::types::{token_signature, IdentityContext, Session};

/// Provider-issued claims tracked for one access token.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub identity: IdentityContext,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Shared session store; clones observe the same records.
#[derive(Clone, Debug, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a freshly minted session. Only the token signature is stored,
    /// never the raw token.
    pub fn register(&self, session: &Session) {
        if let Ok(mut records) = self.inner.lock() {
            records.insert(
                token_signature(&session.access_token),
                SessionRecord {
                    identity: session.identity.clone(),
                    issued_at: session.issued_at,
                    expires_at: session.expires_at,
                },
            );
        }
    }

    #[must_use]
    pub fn lookup(&self, token_signature: &str) -> Option<SessionRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|records| records.get(token_signature).cloned())
    }

    pub fn remove(&self, token_signature: &str) -> Option<SessionRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|mut records| records.remove(token_signature))
    }

    /// Drop records past their expiry. Returns how many were removed.
    pub fn purge_expired(&self, now: i64) -> usize {
        let Ok(mut records) = self.inner.lock() else {
            return 0;
        };
        let before = records.len();
        records.retain(|_, record| record.expires_at >= now);
        before - records.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().map(|records| records.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::types::Role;
    use uuid::Uuid;

    fn session(access: &str, expires_at: i64) -> Session {
        Session {
            access_token: access.to_string(),
            refresh_token: "refresh-token-0000000000".to_string(),
            issued_at: 0,
            expires_at,
            identity: IdentityContext {
                identity_id: Uuid::new_v4(),
                email: "user@example.com".to_string(),
                role: Role::Patient,
            },
        }
    }

    #[test]
    fn register_and_lookup_by_signature() {
        let store = SessionStore::new();
        let session = session("access-token-00000000000", 1_000);
        store.register(&session);

        let signature = token_signature(&session.access_token);
        let record = store.lookup(&signature);
        assert!(record.is_some());
        if let Some(record) = record {
            assert_eq!(record.identity, session.identity);
            assert_eq!(record.expires_at, 1_000);
        }
        // Raw tokens are not usable as keys.
        assert!(store.lookup(&session.access_token).is_none());
    }

    #[test]
    fn purge_drops_expired_records() {
        let store = SessionStore::new();
        store.register(&session("expired-token-0000000000", 100));
        store.register(&session("live-token-0000000000000", 1_000));

        assert_eq!(store.purge_expired(500), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn remove_returns_the_record() {
        let store = SessionStore::new();
        let session = session("access-token-00000000000", 1_000);
        store.register(&session);

        let signature = token_signature(&session.access_token);
        assert!(store.remove(&signature).is_some());
        assert!(store.lookup(&signature).is_none());
        assert!(store.remove(&signature).is_none());
    }
}
