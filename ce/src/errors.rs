//! Error taxonomy and its mapping onto HTTP responses.

use std::io::Cursor;

use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CeError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CeError {
    fn category(&self) -> &'static str {
        match self {
            CeError::Validation(_) => "validation_error",
            CeError::NotFound(_) => "not_found",
            CeError::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> Status {
        match self {
            CeError::Validation(_) => Status::BadRequest,
            CeError::NotFound(_) => Status::NotFound,
            CeError::Internal(_) => Status::InternalServerError,
        }
    }
}

impl From<anyhow::Error> for CeError {
    fn from(err: anyhow::Error) -> Self {
        CeError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for CeError {
    fn from(err: std::io::Error) -> Self {
        CeError::Internal(err.to_string())
    }
}

impl<'r> Responder<'r, 'r> for CeError {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        if matches!(self, CeError::Internal(_)) {
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
