//! Bundle decode, normalization pass, and forwarding to the Clinical
//! Emitter's process endpoint.

use chrono::Utc;
use serde_json::{json, Value};

use crate::config::Config;
use crate::errors::IgError;
use crate::model::{ClinicalProcessResponse, Demographics, EntryResult, SubmissionResult, SubmissionStatus};
use crate::observation::normalize_observation;

/// Extract the Observation resources from a FHIR transaction Bundle.
pub fn extract_observations(bundle: &Value) -> Result<Vec<Value>, IgError> {
    let entries = bundle
        .get("entry")
        .and_then(Value::as_array)
        .ok_or_else(|| IgError::Validation("bundle has no entry array".into()))?;

    if entries.is_empty() {
        return Err(IgError::Validation("bundle has no entries".into()));
    }

    let mut observations = Vec::with_capacity(entries.len());
    for entry in entries {
        let resource = entry
            .get("resource")
            .ok_or_else(|| IgError::Validation("bundle entry missing resource".into()))?;
        if resource.get("resourceType").and_then(Value::as_str) != Some("Observation") {
            return Err(IgError::Validation("bundle entry is not an Observation".into()));
        }
        observations.push(resource.clone());
    }
    Ok(observations)
}

pub struct ForwardOutcome {
    pub result: SubmissionResult,
    /// The exact JSON forwarded to the emitter, for audit hashing. Never
    /// logged or persisted verbatim — only its hash leaves this module.
    pub payload_json: String,
    /// Set when the failure was a request timeout: the caller must not
    /// populate the idempotency cache in that case, per §4.2's "client may
    /// retry with the same key" requirement.
    pub timed_out: bool,
}

pub async fn forward(
    http: &reqwest::Client,
    config: &Config,
    patient_id: &str,
    demographics: Option<&Demographics>,
    mut observations: Vec<Value>,
    idempotency_key: &str,
) -> ForwardOutcome {
    for observation in observations.iter_mut() {
        normalize_observation(observation);
    }

    let total = observations.len();
    let mut payload = json!({
        "patientId": patient_id,
        "observations": observations,
    });
    if let Some(demographics) = demographics {
        payload["patientFirstName"] = json!(demographics.given_name);
        payload["patientLastName"] = json!(demographics.family_name);
        payload["patientDateOfBirth"] = json!(demographics.date_of_birth);
    }
    let payload_json = payload.to_string();

    let response = http
        .post(config.process_url())
        .timeout(config.submit_timeout)
        .json(&payload)
        .send()
        .await;

    let mut timed_out = false;
    let (status, successful, failed, results) = match response {
        Ok(resp) if resp.status().is_success() => match resp.json::<ClinicalProcessResponse>().await {
            Ok(parsed) => from_clinical_response(parsed),
            Err(_) => all_failed(total, "downstream returned an unparseable body"),
        },
        Ok(resp) => all_failed(total, &format!("downstream returned status {}", resp.status())),
        Err(err) => {
            timed_out = err.is_timeout();
            all_failed(total, &format!("downstream unreachable: {err}"))
        }
    };

    ForwardOutcome {
        result: SubmissionResult {
            status,
            total_processed: total,
            successful,
            failed,
            idempotency_key: idempotency_key.to_string(),
            results,
            processed_at: Utc::now().to_rfc3339(),
        },
        payload_json,
        timed_out,
    }
}

fn from_clinical_response(parsed: ClinicalProcessResponse) -> (SubmissionStatus, usize, usize, Vec<EntryResult>) {
    let results = parsed
        .results
        .into_iter()
        .enumerate()
        .map(|(index, entry)| EntryResult {
            index,
            success: entry.error.is_none(),
            gdt_file_name: entry.gdt_file_name,
            error: entry.error,
        })
        .collect();
    (parsed.status, parsed.successful, parsed.failed, results)
}

fn all_failed(total: usize, reason: &str) -> (SubmissionStatus, usize, usize, Vec<EntryResult>) {
    let results = (0..total)
        .map(|index| EntryResult {
            index,
            success: false,
            gdt_file_name: None,
            error: Some(reason.to_string()),
        })
        .collect();
    (SubmissionStatus::Error, 0, total, results)
}
