//! Refresh-token revocation.
//!
//! A refresh token is single-use: rotation revokes the presented `jti`, and logout revokes it
//! explicitly. Entries only need to live until the token would have expired anyway.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::Utc;

#[derive(Debug, thiserror::Error)]
pub enum RevocationError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(String),
}

pub trait RevocationStore: Send + Sync {
    /// Revokes `jti` until `expires_at` (Unix seconds).
    ///
    /// Returns `false` if it was already revoked, so callers can consume a token exactly once.
    fn revoke(&self, jti: &str, expires_at: i64) -> Result<bool, RevocationError>;

    fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError>;
}

/// Process-local store. Expired entries are purged on write.
#[derive(Debug, Default)]
pub struct InMemoryRevocationStore {
    entries: Mutex<HashMap<String, i64>>,
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RevocationStore for InMemoryRevocationStore {
    fn revoke(&self, jti: &str, expires_at: i64) -> Result<bool, RevocationError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| RevocationError::Unavailable(e.to_string()))?;

        let now = Utc::now().timestamp();
        entries.retain(|_, exp| *exp > now);

        Ok(entries.insert(jti.to_string(), expires_at).is_none())
    }

    fn is_revoked(&self, jti: &str) -> Result<bool, RevocationError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| RevocationError::Unavailable(e.to_string()))?;
        Ok(entries.contains_key(jti))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_once() {
        let store = InMemoryRevocationStore::new();
        let exp = Utc::now().timestamp() + 3600;

        assert!(!store.is_revoked("refresh-a").unwrap());
        assert!(store.revoke("refresh-a", exp).unwrap());
        assert!(!store.revoke("refresh-a", exp).unwrap());
        assert!(store.is_revoked("refresh-a").unwrap());
    }

    #[test]
    fn test_expired_entries_are_purged() {
        let store = InMemoryRevocationStore::new();
        let now = Utc::now().timestamp();

        store.revoke("old", now - 10).unwrap();
        store.revoke("fresh", now + 3600).unwrap();

        assert_eq!(store.len(), 1);
        assert!(!store.is_revoked("old").unwrap());
    }
}
