//! `GET /api/v1/status/<patient_id>` — last-known transfer outcome.

use rocket::serde::json::Json;
use rocket::{get, State};

use crate::errors::CeError;
use crate::model::StatusDocument;
use crate::state::CeState;
use crate::status_store::StatusStore;

#[get("/api/v1/status/<patient_id>")]
pub fn status(patient_id: &str, app: &State<CeState>) -> Result<Json<StatusDocument>, CeError> {
    let record = app
        .status
        .get(patient_id)
        .ok_or_else(|| CeError::NotFound(format!("no recorded transfer for patient {patient_id}")))?;
    Ok(Json(StatusStore::to_document(&record)))
}
