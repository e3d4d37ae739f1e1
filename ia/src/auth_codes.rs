//! Authorization-code store: single-use, 10-minute expiry.

use std::path::PathBuf;

use chrono::Utc;

use crate::model::AuthorizationCode;
use crate::random::opaque_token;
use pghd_shared::store::AppendStore;

pub struct AuthCodeStore {
    records: AppendStore<AuthorizationCode>,
}

#[allow(clippy::too_many_arguments)]
impl AuthCodeStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let now = Utc::now();
        Ok(Self {
            records: AppendStore::open(path, move |c: &AuthorizationCode| !c.is_expired(now))?,
        })
    }

    pub fn issue(
        &self,
        client_id: &str,
        subject: &str,
        redirect_uri: &str,
        code_challenge: &str,
        code_challenge_method: &str,
        scope: &str,
        state: &str,
    ) -> anyhow::Result<AuthorizationCode> {
        let code = AuthorizationCode {
            code: opaque_token(32),
            client_id: client_id.to_string(),
            subject: subject.to_string(),
            redirect_uri: redirect_uri.to_string(),
            code_challenge: code_challenge.to_string(),
            code_challenge_method: code_challenge_method.to_string(),
            scope: scope.to_string(),
            state: state.to_string(),
            created_at: Utc::now(),
        };
        self.records.mutate(|m| {
            m.insert(code.code.clone(), code.clone());
        })?;
        Ok(code)
    }

    /// Atomically consume `value`: at most one concurrent caller sees
    /// `Some`.
    pub fn consume(&self, value: &str) -> anyhow::Result<Option<AuthorizationCode>> {
        let now = Utc::now();
        self.records.mutate(|m| match m.remove(value) {
            Some(code) if !code.is_expired(now) => Some(code),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_is_atomic_single_use() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthCodeStore::open(dir.path().join("auth_codes.txt")).unwrap();
        let issued = store
            .issue("client-facing-server", "1", "http://localhost/cb", "chal", "S256", "openid", "xyz")
            .unwrap();

        assert!(store.consume(&issued.code).unwrap().is_some());
        assert!(store.consume(&issued.code).unwrap().is_none());
    }

    #[test]
    fn unknown_code_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AuthCodeStore::open(dir.path().join("auth_codes.txt")).unwrap();
        assert!(store.consume("never-issued").unwrap().is_none());
    }
}
