//! Request guards. Request-scoped, never thread-local, per §9.

use rocket::http::Status;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::State;

use crate::state::IaState;

/// Gates `/patients*` behind `IAM_ADMIN_TOKEN` when one is configured. With
/// no admin token configured, every request passes (matches the source's
/// documented, unauthenticated behavior).
pub struct AdminAuth;

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AdminAuth {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let app = match request.guard::<&State<IaState>>().await {
            Outcome::Success(app) => app,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let Some(expected) = &app.config.admin_token else {
            return Outcome::Success(AdminAuth);
        };

        let header = request.headers().get_one("Authorization");
        match header.and_then(|h| h.strip_prefix("Bearer ")) {
            Some(token) if token == expected => Outcome::Success(AdminAuth),
            _ => Outcome::Error((Status::Forbidden, ())),
        }
    }
}
