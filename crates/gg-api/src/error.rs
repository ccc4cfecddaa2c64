//! Maps service failures onto HTTP responses with a `{ "error": ... }` body.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use gg_core::error::GossipError;
use gg_core::models::ErrorBody;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Details stay in the logs; clients only see the summary.
    #[error("{0}")]
    Internal(&'static str),
}

impl From<GossipError> for ApiError {
    fn from(err: GossipError) -> Self {
        match err {
            GossipError::Validation(message) => ApiError::BadRequest(message),
            GossipError::NotFound(id) => ApiError::NotFound(format!("Gossip {id} not found")),
            GossipError::Persistence(_) => ApiError::Internal("Gossip store is unavailable"),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
