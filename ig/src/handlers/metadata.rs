//! Unannounced, unauthenticated bootstrap document for the mobile client.

use rocket::serde::json::Json;
use rocket::{get, State};

use crate::model::Metadata;
use crate::state::IgState;

#[get("/api/v1/metadata")]
pub fn metadata(app: &State<IgState>) -> Json<Metadata> {
    Json(Metadata {
        server_version: env!("CARGO_PKG_VERSION").to_string(),
        iam_discovery_url: app.config.discovery_url(),
        supported_resource_types: vec!["Observation".to_string()],
    })
}
