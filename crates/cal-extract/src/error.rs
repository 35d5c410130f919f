//! Error type for `cal-extract`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("no API key configured for the extraction model")]
  MissingApiKey,

  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("model API returned {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body:   String,
  },

  #[error("model response contained no text")]
  EmptyResponse,

  #[error("model response is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("model response is not a JSON object")]
  NotAnObject,

  #[error("model response has an unreadable date: {0:?}")]
  InvalidDate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
