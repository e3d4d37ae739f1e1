//! Wire DTOs, kept local to this crate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessRequest {
    pub patient_id: String,
    #[serde(default)]
    pub patient_first_name: Option<String>,
    #[serde(default)]
    pub patient_last_name: Option<String>,
    #[serde(default)]
    pub patient_date_of_birth: Option<String>,
    pub observations: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdt_file_name: Option<String>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<EntryResult>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDocument {
    pub has_successful_transfer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_successful_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error_kind: Option<String>,
    pub pending_count: u64,
}
