//! `/patients[/id]`: register / list / get / delete, gated by [`AdminAuth`].

use rocket::serde::json::Json;
use rocket::{delete, get, post, State};
use serde::Deserialize;

use crate::errors::IaError;
use crate::guards::AdminAuth;
use crate::model::Patient;
use crate::state::IaState;

#[derive(Debug, Deserialize)]
pub struct RegisterPatient {
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: String,
}

#[post("/patients", data = "<body>")]
pub fn register(_admin: AdminAuth, body: Json<RegisterPatient>, app: &State<IaState>) -> Result<Json<Patient>, IaError> {
    let body = body.into_inner();
    let patient = app
        .patients
        .register(body.given_name, body.family_name, body.date_of_birth)
        .map_err(IaError::from)?;
    Ok(Json(patient))
}

#[get("/patients")]
pub fn list(_admin: AdminAuth, app: &State<IaState>) -> Json<Vec<Patient>> {
    Json(app.patients.list())
}

#[get("/patients/<id>")]
pub fn get_one(_admin: AdminAuth, id: &str, app: &State<IaState>) -> Result<Json<Patient>, IaError> {
    app.patients
        .get(id)
        .map(Json)
        .ok_or_else(|| IaError::NotFound(format!("no patient {id}")))
}

#[delete("/patients/<id>")]
pub fn delete_one(_admin: AdminAuth, id: &str, app: &State<IaState>) -> Result<(), IaError> {
    let removed = app.patients.delete(id, &app.refresh_tokens).map_err(IaError::from)?;
    if removed {
        Ok(())
    } else {
        Err(IaError::NotFound(format!("no patient {id}")))
    }
}
