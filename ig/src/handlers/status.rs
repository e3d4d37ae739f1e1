//! Authenticated, rate-limited transfer-status lookup, proxied to the
//! Clinical Emitter.

use chrono::Utc;
use rocket::get;
use rocket::serde::json::Json;
use rocket::State;
use serde::Deserialize;

use crate::errors::IgError;
use crate::model::{AuthenticatedSubject, StatusDocument};
use crate::rate_limit::Decision;
use crate::state::IgState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClinicalStatusResponse {
    has_successful_transfer: bool,
    #[serde(default)]
    last_successful_at: Option<String>,
    #[serde(default)]
    last_attempt_at: Option<String>,
    #[serde(default)]
    last_error_kind: Option<String>,
    #[serde(default)]
    pending_count: u64,
}

#[get("/api/v1/status")]
pub async fn status(subject: AuthenticatedSubject, app: &State<IgState>) -> Result<Json<StatusDocument>, IgError> {
    match app.rate_limiter.check(&subject.subject, Utc::now()) {
        Decision::Rejected { retry_after_secs } => {
            app.audit.rejection("rate_limit", "rate_limit_exceeded");
            return Err(IgError::RateLimited { retry_after_secs });
        }
        Decision::Allowed => {}
    }

    let response = app
        .http
        .get(app.config.status_url(&subject.subject))
        .timeout(app.config.submit_timeout)
        .send()
        .await;

    let document = match response {
        Ok(resp) if resp.status().is_success() => match resp.json::<ClinicalStatusResponse>().await {
            Ok(parsed) => StatusDocument {
                has_successful_transfer: parsed.has_successful_transfer,
                last_successful_at: parsed.last_successful_at,
                last_attempt_at: parsed.last_attempt_at,
                last_error_kind: parsed.last_error_kind,
                pending_count: parsed.pending_count,
            },
            Err(_) => StatusDocument::default(),
        },
        _ => StatusDocument::default(),
    };

    app.audit.status_query(&subject.subject, "queried");
    Ok(Json(document))
}
