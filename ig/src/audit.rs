//! Append-only audit trail. Never contains PHI: payloads are hashed, never
//! stored verbatim.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use pghd_shared::store::AppendLog;
use serde::Serialize;
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub event: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "payloadHashSHA256")]
    pub payload_hash_sha256: Option<String>,
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

pub struct AuditLog {
    log: AppendLog,
}

impl AuditLog {
    pub fn open(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        Ok(Self {
            log: AppendLog::open(path)?,
        })
    }

    pub fn record(&self, entry: AuditEntry) {
        if let Err(err) = self.log.append(&entry) {
            log::error!("failed to write audit entry: {err}");
        }
    }

    pub fn submission(&self, idempotency_key: &str, subject: &str, payload: &str, outcome: &str, count: usize) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            event: "submission",
            idempotency_key: Some(idempotency_key.to_string()),
            subject: Some(subject.to_string()),
            payload_hash_sha256: Some(hex::encode(Sha256::digest(payload.as_bytes()))),
            outcome: outcome.to_string(),
            count: Some(count),
        });
    }

    pub fn status_query(&self, subject: &str, outcome: &str) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            event: "status_query",
            idempotency_key: None,
            subject: Some(subject.to_string()),
            payload_hash_sha256: None,
            outcome: outcome.to_string(),
            count: None,
        });
    }

    pub fn rejection(&self, event: &'static str, reason: &str) {
        self.record(AuditEntry {
            timestamp: Utc::now(),
            event,
            idempotency_key: None,
            subject: None,
            payload_hash_sha256: None,
            outcome: reason.to_string(),
            count: None,
        });
    }
}
