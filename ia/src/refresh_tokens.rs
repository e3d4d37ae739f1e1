//! Refresh-token store: single-use with rotation, cascade-revocable by
//! subject.

use std::path::PathBuf;

use chrono::Utc;

use crate::model::RefreshToken;
use crate::random::opaque_token;
use pghd_shared::store::AppendStore;

pub struct RefreshTokenStore {
    records: AppendStore<RefreshToken>,
}

impl RefreshTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let now = Utc::now();
        Ok(Self {
            records: AppendStore::open(path, move |t: &RefreshToken| !t.is_expired(now))?,
        })
    }

    pub fn issue(&self, subject: &str, scope: &str) -> anyhow::Result<RefreshToken> {
        let token = RefreshToken {
            token: opaque_token(32),
            subject: subject.to_string(),
            scope: scope.to_string(),
            created_at: Utc::now(),
        };
        self.records.mutate(|m| {
            m.insert(token.token.clone(), token.clone());
        })?;
        Ok(token)
    }

    /// Atomically remove and return the binding for `value`, or `None` if it
    /// is unknown or expired. A code "not found or expired is
    /// indistinguishable from never-issued" per §3.
    pub fn consume(&self, value: &str) -> anyhow::Result<Option<RefreshToken>> {
        let now = Utc::now();
        self.records.mutate(|m| match m.remove(value) {
            Some(token) if !token.is_expired(now) => Some(token),
            _ => None,
        })
    }

    pub fn revoke(&self, value: &str) -> anyhow::Result<()> {
        self.records.mutate(|m| {
            m.remove(value);
        })?;
        Ok(())
    }

    pub fn revoke_all_for_subject(&self, subject: &str) -> anyhow::Result<()> {
        self.records.mutate(|m| {
            m.retain(|_, token| token.subject != subject);
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_is_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefreshTokenStore::open(dir.path().join("refresh_tokens.txt")).unwrap();
        let issued = store.issue("1", "openid observation.write").unwrap();

        let first = store.consume(&issued.token).unwrap();
        let second = store.consume(&issued.token).unwrap();
        assert!(first.is_some());
        assert!(second.is_none());
    }

    #[test]
    fn cascade_revoke_removes_every_token_for_subject() {
        let dir = tempfile::tempdir().unwrap();
        let store = RefreshTokenStore::open(dir.path().join("refresh_tokens.txt")).unwrap();
        store.issue("1", "openid").unwrap();
        store.issue("1", "openid").unwrap();
        store.issue("2", "openid").unwrap();

        store.revoke_all_for_subject("1").unwrap();
        let remaining = store.records.read(|m| m.len());
        assert_eq!(remaining, 1);
    }
}
