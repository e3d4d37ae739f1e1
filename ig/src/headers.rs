//! Small header-extraction request guards.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};

use crate::errors::IgError;

pub struct IdempotencyKey(pub String);

#[rocket::async_trait]
impl<'r> FromRequest<'r> for IdempotencyKey {
    type Error = IgError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.headers().get_one("Idempotency-Key") {
            Some(key) if !key.trim().is_empty() => Outcome::Success(IdempotencyKey(key.to_string())),
            _ => Outcome::Error((
                Status::BadRequest,
                IgError::Validation("missing Idempotency-Key header".into()),
            )),
        }
    }
}
