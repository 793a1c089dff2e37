//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use hireloop_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The identity header is missing or malformed.
  #[error("not authenticated")]
  Unauthorized,

  /// The caller has no profile entitling them to the operation.
  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Any error surfaced by the store, already classified.
  #[error("{message}")]
  Store { kind: ErrorKind, message: String },
}

impl ApiError {
  pub fn store<E: Classify + std::error::Error>(e: E) -> Self {
    Self::Store {
      kind:    e.kind(),
      message: e.to_string(),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Self::Unauthorized => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Store { kind, .. } => status_for(*kind),
    }
  }
}

/// The HTTP status each error kind is reported with.
pub fn status_for(kind: ErrorKind) -> StatusCode {
  match kind {
    ErrorKind::NotFound => StatusCode::NOT_FOUND,
    ErrorKind::Conflict | ErrorKind::InvalidState => StatusCode::CONFLICT,
    ErrorKind::IntegrityViolation => StatusCode::UNPROCESSABLE_ENTITY,
    ErrorKind::Validation => StatusCode::BAD_REQUEST,
    ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
    ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = match &self {
      Self::Store { kind, message } => json!({ "error": message, "kind": kind }),
      other => json!({ "error": other.to_string() }),
    };
    (status, Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use hireloop_core::Error as CoreError;

  use super::*;

  #[test]
  fn store_errors_keep_their_kind() {
    let err = ApiError::store(CoreError::TooManyTags { count: 6, max: 5 });
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);

    let err = ApiError::store(CoreError::not_found("appointment", 7));
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
  }

  #[test]
  fn state_machine_violations_are_conflicts() {
    assert_eq!(status_for(ErrorKind::InvalidState), StatusCode::CONFLICT);
    assert_eq!(status_for(ErrorKind::Conflict), StatusCode::CONFLICT);
    assert_eq!(
      status_for(ErrorKind::IntegrityViolation),
      StatusCode::UNPROCESSABLE_ENTITY
    );
  }
}
