//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use depot_core::ErrorKind;
use thiserror::Error;

use crate::envelope;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The request could not be decoded (body, path or query string).
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Core(#[from] depot_core::Error),
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::BadRequest(rejection.body_text()) }
}

/// HTTP status for each error kind.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::InvalidArgument | ErrorKind::InsufficientStock => StatusCode::BAD_REQUEST,
    ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict => StatusCode::CONFLICT,
    ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

fn message_for(kind: ErrorKind) -> &'static str {
  match kind {
    ErrorKind::InvalidArgument => "Validation failed",
    ErrorKind::Unauthenticated => "Authentication required",
    ErrorKind::NotFound => "Resource not found",
    ErrorKind::Conflict => "Resource already exists",
    ErrorKind::InsufficientStock => "Insufficient stock",
    ErrorKind::Unavailable => "Service unavailable",
    ErrorKind::Timeout => "Request timed out",
    ErrorKind::Internal => "Internal server error",
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::BadRequest(detail) => envelope::failure(
        StatusCode::BAD_REQUEST,
        "Invalid request",
        ErrorKind::InvalidArgument,
        detail,
      ),
      ApiError::Core(e) => {
        let kind = e.kind();
        // Backend details stay in the log.
        let detail = match kind {
          ErrorKind::Internal | ErrorKind::Unavailable => {
            tracing::error!(error = %e, %kind, "request failed");
            message_for(kind).to_string()
          }
          ErrorKind::Timeout => {
            tracing::warn!(error = %e, "store call timed out");
            e.to_string()
          }
          _ => e.to_string(),
        };
        envelope::failure(status_for(kind), message_for(kind), kind, detail)
      }
    }
  }
}
