//! Error taxonomy and its mapping onto HTTP responses.

use std::io::Cursor;

use rocket::http::{ContentType, Header, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IgError {
    #[error("authentication error: {0}")]
    Authentication(String),

    #[error("rate limit exceeded")]
    RateLimited { retry_after_secs: i64 },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IgError {
    fn category(&self) -> &'static str {
        match self {
            IgError::Authentication(_) => "authentication_error",
            IgError::RateLimited { .. } => "rate_limit_exceeded",
            IgError::Validation(_) => "validation_error",
            IgError::Forbidden(_) => "forbidden",
            IgError::NotFound(_) => "not_found",
            IgError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> Status {
        match self {
            IgError::Authentication(_) => Status::Unauthorized,
            IgError::RateLimited { .. } => Status::TooManyRequests,
            IgError::Validation(_) => Status::BadRequest,
            IgError::Forbidden(_) => Status::Forbidden,
            IgError::NotFound(_) => Status::NotFound,
            IgError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<anyhow::Error> for IgError {
    fn from(err: anyhow::Error) -> Self {
        IgError::Internal(err.to_string())
    }
}

impl<'r> Responder<'r, 'r> for IgError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        if matches!(self, IgError::Internal(_)) {
            log::error!("{self}");
        } else {
            log::debug!("request rejected: {self}");
        }
        let mut body = serde_json::json!({ "error": self.category(), "message": self.to_string() });
        let mut builder = Response::build();
        if let IgError::RateLimited { retry_after_secs } = &self {
            body["retryAfterSeconds"] = serde_json::json!(retry_after_secs);
            builder.header(Header::new("Retry-After", retry_after_secs.to_string()));
        }
        let body = body.to_string();
        builder
            .status(self.status())
            .header(ContentType::JSON)
            .sized_body(body.len(), Cursor::new(body))
            .ok()
    }
}
