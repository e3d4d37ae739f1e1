//! Authenticated, idempotent, rate-limited observation submission.

use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{post, response, State};
use serde_json::Value;

use crate::errors::IgError;
use crate::forwarding::{extract_observations, forward};
use crate::headers::IdempotencyKey;
use crate::model::{AuthenticatedSubject, SubmissionResult};
use crate::rate_limit::Decision;
use crate::state::IgState;

#[post("/api/v1/observations", data = "<bundle>")]
pub async fn submit(
    subject: AuthenticatedSubject,
    idempotency_key: IdempotencyKey,
    bundle: Json<Value>,
    app: &State<IgState>,
) -> Result<response::status::Custom<Json<SubmissionResult>>, IgError> {
    match app.rate_limiter.check(&subject.subject, Utc::now()) {
        Decision::Rejected { retry_after_secs } => {
            app.audit.rejection("rate_limit", "rate_limit_exceeded");
            return Err(IgError::RateLimited { retry_after_secs });
        }
        Decision::Allowed => {}
    }

    if let Some(cached) = app.idempotency.lookup(&idempotency_key.0, &subject.subject) {
        let result: SubmissionResult = serde_json::from_str(&cached.response_json)
            .map_err(|e| IgError::Internal(format!("corrupt cached submission result: {e}")))?;
        return Ok(response::status::Custom(Status::Ok, Json(result)));
    }

    let observations = extract_observations(&bundle)?;
    let outcome = forward(
        &app.http,
        &app.config,
        &subject.subject,
        subject.demographics.as_ref(),
        observations,
        &idempotency_key.0,
    )
    .await;

    app.audit.submission(
        &idempotency_key.0,
        &subject.subject,
        &outcome.payload_json,
        &format!("{:?}", outcome.result.status).to_lowercase(),
        outcome.result.total_processed,
    );

    if outcome.timed_out {
        // Not cached: the client may retry this same key once the downstream
        // emitter recovers.
        return Ok(response::status::Custom(Status::Ok, Json(outcome.result)));
    }

    let response_json = serde_json::to_string(&outcome.result)
        .map_err(|e| IgError::Internal(format!("serializing submission result: {e}")))?;
    let canonical = app.idempotency.store_if_absent(&idempotency_key.0, &subject.subject, response_json, 201)?;
    let canonical_result: SubmissionResult = serde_json::from_str(&canonical.response_json)
        .map_err(|e| IgError::Internal(format!("corrupt cached submission result: {e}")))?;

    Ok(response::status::Custom(Status::Created, Json(canonical_result)))
}
