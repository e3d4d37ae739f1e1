//! Wire DTOs. Kept local to this crate per the platform's "own wire-format
//! DTOs locally" convention — these are independently deployable services.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub crv: String,
    pub x: String,
    pub y: String,
    pub kid: String,
    #[serde(rename = "use")]
    pub use_: String,
    pub alg: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Demographics {
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccessTokenClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub scope: String,
    #[serde(default)]
    pub demographics: Option<Demographics>,
}

/// A verified caller, propagated request-scoped by the `AuthenticatedSubject`
/// guard; never a thread-local, per §9.
#[derive(Debug, Clone)]
pub struct AuthenticatedSubject {
    pub subject: String,
    pub scope: String,
    pub demographics: Option<Demographics>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub server_version: String,
    pub iam_discovery_url: String,
    pub supported_resource_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResult {
    pub index: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gdt_file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Partial,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub idempotency_key: String,
    pub results: Vec<EntryResult>,
    pub processed_at: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalProcessResponse {
    pub status: SubmissionStatus,
    #[allow(dead_code)]
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub results: Vec<ClinicalEntryResult>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClinicalEntryResult {
    #[serde(default)]
    pub gdt_file_name: Option<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
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

impl Default for StatusDocument {
    fn default() -> Self {
        Self {
            has_successful_transfer: false,
            last_successful_at: None,
            last_attempt_at: None,
            last_error_kind: None,
            pending_count: 0,
        }
    }
}
