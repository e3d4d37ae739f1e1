//! Per-subject transfer status. The store's own record keeps more detail
//! than the wire `StatusDocument`; `pending_count` is always zero in this
//! design since CE is purely synchronous (no queued transfers), per the
//! recorded ceiling in DESIGN.md.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pghd_shared::store::{AppendStore, Keyed};
use serde::{Deserialize, Serialize};

use crate::model::StatusDocument;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransferStatus {
    pub subject: String,
    pub successful_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_at: Option<DateTime<Utc>>,
    pub last_attempt_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_kind: Option<String>,
}

impl Keyed for TransferStatus {
    fn store_key(&self) -> String {
        self.subject.clone()
    }
}

pub struct StatusStore {
    records: AppendStore<TransferStatus>,
}

impl StatusStore {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            records: AppendStore::open(path, |_| true)?,
        })
    }

    pub fn record_attempt(&self, subject: &str, succeeded: bool, error_kind: Option<&str>) -> anyhow::Result<()> {
        let now = Utc::now();
        self.records.mutate(|m| {
            let entry = m.entry(subject.to_string()).or_insert_with(|| TransferStatus {
                subject: subject.to_string(),
                successful_count: 0,
                last_successful_at: None,
                last_attempt_at: now,
                last_error_kind: None,
            });
            entry.last_attempt_at = now;
            if succeeded {
                entry.successful_count += 1;
                entry.last_successful_at = Some(now);
                entry.last_error_kind = None;
            } else {
                entry.last_error_kind = error_kind.map(str::to_string);
            }
        })?;
        Ok(())
    }

    pub fn get(&self, subject: &str) -> Option<TransferStatus> {
        self.records.read(|m| m.get(subject).cloned())
    }

    pub fn to_document(status: &TransferStatus) -> StatusDocument {
        StatusDocument {
            has_successful_transfer: status.successful_count > 0,
            last_successful_at: status.last_successful_at.map(|t| t.to_rfc3339()),
            last_attempt_at: Some(status.last_attempt_at.to_rfc3339()),
            last_error_kind: status.last_error_kind.clone(),
            pending_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_successful_count_across_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path().join("status.txt")).unwrap();
        store.record_attempt("1", true, None).unwrap();
        store.record_attempt("1", true, None).unwrap();
        store.record_attempt("1", false, Some("internal_error")).unwrap();

        let status = store.get("1").unwrap();
        assert_eq!(status.successful_count, 2);
        assert_eq!(status.last_error_kind.as_deref(), Some("internal_error"));
    }

    #[test]
    fn unknown_subject_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = StatusStore::open(dir.path().join("status.txt")).unwrap();
        assert!(store.get("nope").is_none());
    }
}
