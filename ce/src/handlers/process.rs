//! `POST /api/v1/process` — translate a batch of FHIR Observations into GDT
//! files written to the exchange directory, one file per observation.

use std::sync::atomic::Ordering;

use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{post, State};

use crate::errors::CeError;
use crate::gdt;
use crate::mapping;
use crate::model::{EntryResult, ProcessRequest, SubmissionResult, SubmissionStatus};
use crate::state::CeState;

#[post("/api/v1/process", data = "<request>")]
pub fn process(request: Json<ProcessRequest>, app: &State<CeState>) -> Result<Json<SubmissionResult>, CeError> {
    let request = request.into_inner();
    if request.observations.is_empty() {
        return Err(CeError::Validation("observations must not be empty".to_string()));
    }

    let demographics = crate::model::Demographics {
        given_name: request.patient_first_name.clone(),
        family_name: request.patient_last_name.clone(),
        date_of_birth: request.patient_date_of_birth.clone(),
    };

    let mut results = Vec::with_capacity(request.observations.len());
    let mut successful = 0usize;
    let mut failed = 0usize;

    for mut observation in request.observations {
        mapping::ensure_subject(&mut observation, &request.patient_id, Some(&demographics));
        let (fields, warnings) = mapping::map_observation(&observation);
        let document = gdt::build_document(&app.config.sender_id, &app.config.receiver_id, &fields);

        match write_document(app, &document) {
            Ok(file_name) => {
                successful += 1;
                if let Err(err) = app.status.record_attempt(&request.patient_id, true, None) {
                    log::error!("failed to record transfer status for {}: {err}", request.patient_id);
                }
                results.push(EntryResult { gdt_file_name: Some(file_name), warnings, error: None });
            }
            Err(err) => {
                failed += 1;
                if let Err(status_err) = app.status.record_attempt(&request.patient_id, false, Some("write_error")) {
                    log::error!("failed to record transfer status for {}: {status_err}", request.patient_id);
                }
                results.push(EntryResult { gdt_file_name: None, warnings, error: Some(err.to_string()) });
            }
        }
    }

    let status = if failed == 0 {
        SubmissionStatus::Success
    } else if successful == 0 {
        SubmissionStatus::Error
    } else {
        SubmissionStatus::Partial
    };

    Ok(Json(SubmissionResult {
        status,
        total_processed: results.len(),
        successful,
        failed,
        results,
    }))
}

fn write_document(app: &CeState, document: &[u8]) -> std::io::Result<String> {
    let timestamp = Utc::now().format("%Y%m%dT%H%M%S%.6f");
    let mut file_name = format!("obs_{timestamp}.gdt");
    let mut path = app.config.output_path.join(&file_name);
    while path.exists() {
        let sequence = app.filename_sequence.fetch_add(1, Ordering::SeqCst);
        file_name = format!("obs_{timestamp}_{sequence}.gdt");
        path = app.config.output_path.join(&file_name);
    }
    std::fs::write(&path, document)?;
    Ok(file_name)
}
