//! Write-once idempotency cache, keyed by `(Idempotency-Key, subject)`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pghd_shared::store::{AppendStore, Keyed};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdempotencyEntry {
    pub key: String,
    pub subject: String,
    pub response_json: String,
    pub status_code: u16,
    pub created_at: DateTime<Utc>,
}

impl IdempotencyEntry {
    pub const TTL_SECONDS: i64 = 24 * 60 * 60;

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        (now - self.created_at).num_seconds() >= Self::TTL_SECONDS
    }

    fn compound_key(key: &str, subject: &str) -> String {
        format!("{key}\u{0}{subject}")
    }
}

impl Keyed for IdempotencyEntry {
    fn store_key(&self) -> String {
        Self::compound_key(&self.key, &self.subject)
    }
}

pub struct IdempotencyStore {
    records: AppendStore<IdempotencyEntry>,
}

impl IdempotencyStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let now = Utc::now();
        Ok(Self {
            records: AppendStore::open(path, |e: &IdempotencyEntry| !e.is_expired(now))?,
        })
    }

    pub fn lookup(&self, key: &str, subject: &str) -> Option<IdempotencyEntry> {
        let compound = IdempotencyEntry::compound_key(key, subject);
        self.records.read(|m| m.get(&compound).cloned())
    }

    /// Record the result of a forwarding attempt for `(key, subject)`,
    /// unless another attempt already won. Returns the entry that is now
    /// canonical for this pair — the caller's own entry if it won, or the
    /// pre-existing one if it lost the race.
    pub fn store_if_absent(
        &self,
        key: &str,
        subject: &str,
        response_json: String,
        status_code: u16,
    ) -> anyhow::Result<IdempotencyEntry> {
        let compound = IdempotencyEntry::compound_key(key, subject);
        self.records.mutate(|m| {
            m.entry(compound)
                .or_insert_with(|| IdempotencyEntry {
                    key: key.to_string(),
                    subject: subject.to_string(),
                    response_json,
                    status_code,
                    created_at: Utc::now(),
                })
                .clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_once_first_attempt_wins() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idempotency.txt")).unwrap();

        let first = store.store_if_absent("k1", "1", "{\"a\":1}".into(), 201).unwrap();
        let second = store.store_if_absent("k1", "1", "{\"a\":2}".into(), 201).unwrap();

        assert_eq!(first.response_json, "{\"a\":1}");
        assert_eq!(second.response_json, "{\"a\":1}");
    }

    #[test]
    fn different_subjects_with_same_key_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idempotency.txt")).unwrap();

        store.store_if_absent("k1", "1", "a".into(), 201).unwrap();
        store.store_if_absent("k1", "2", "b".into(), 201).unwrap();

        assert_eq!(store.lookup("k1", "1").unwrap().response_json, "a");
        assert_eq!(store.lookup("k1", "2").unwrap().response_json, "b");
    }

    #[test]
    fn unknown_pair_misses() {
        let dir = tempfile::tempdir().unwrap();
        let store = IdempotencyStore::open(dir.path().join("idempotency.txt")).unwrap();
        assert!(store.lookup("nope", "1").is_none());
    }
}
