//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The extraction gateway failed or timed out.
  #[error("extraction error: {0}")]
  Extraction(#[source] cal_core::Error),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),

  /// Rendering a CSV download failed.
  #[error("export error: {0}")]
  Export(#[from] csv::Error),
}

impl ApiError {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }
}

impl From<cal_core::Error> for ApiError {
  fn from(e: cal_core::Error) -> Self {
    match e {
      cal_core::Error::EmptyMessage => Self::BadRequest(e.to_string()),
      cal_core::Error::Extraction(_) | cal_core::Error::ExtractionTimeout(_) => {
        Self::Extraction(e)
      }
      cal_core::Error::Storage(inner) => Self::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Extraction(e) => (StatusCode::BAD_GATEWAY, e.to_string()),
      ApiError::Store(e) => {
        error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
      ApiError::Export(e) => {
        error!(error = %e, "csv export failure");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
