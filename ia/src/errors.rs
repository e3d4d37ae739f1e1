//! Error taxonomy and its mapping onto HTTP responses.
//!
//! One enum per §7 category this service can raise; `Responder` turns a
//! value directly into the `{error, message}` JSON body used by all three
//! services, the way the reference codebase's `StaticFileResponse` builds a
//! `rocket::Response` by hand rather than relying on a generic catcher.

use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IaError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IaError {
    fn category(&self) -> &'static str {
        match self {
            IaError::BadRequest(_) => "bad_request",
            IaError::NotFound(_) => "not_found",
            IaError::Forbidden(_) => "forbidden",
            IaError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> Status {
        match self {
            IaError::BadRequest(_) => Status::BadRequest,
            IaError::NotFound(_) => Status::NotFound,
            IaError::Forbidden(_) => Status::Forbidden,
            IaError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<anyhow::Error> for IaError {
    fn from(err: anyhow::Error) -> Self {
        IaError::Internal(err.to_string())
    }
}

impl<'r> Responder<'r, 'r> for IaError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        if matches!(self, IaError::Internal(_)) {
            log::error!("{self}");
        } else {
            log::debug!("request rejected: {self}");
        }
        let body = serde_json::json!({ "error": self.category(), "message": self.to_string() }).to_string();
        Response::build()
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
