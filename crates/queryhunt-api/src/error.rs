//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use queryhunt_game::GameError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing player identity header {0}")]
  MissingIdentity(String),

  #[error(transparent)]
  Game(#[from] GameError),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::MissingIdentity(_) => StatusCode::BAD_REQUEST,
      ApiError::Game(e) => match e {
        GameError::InvalidQuery => StatusCode::UNPROCESSABLE_ENTITY,
        GameError::InvalidIdentity(_) | GameError::Execution(_) | GameError::EmptyAccusation => {
          StatusCode::BAD_REQUEST
        }
        GameError::NotStarted | GameError::AlreadyCompleted => StatusCode::CONFLICT,
        GameError::Generation(_) => StatusCode::BAD_GATEWAY,
        GameError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
