//! Error types for `cal-core`.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The submitted text was empty or whitespace-only.
  #[error("message is empty")]
  EmptyMessage,

  #[error("extraction failed: {0}")]
  Extraction(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("extraction timed out after {0:?}")]
  ExtractionTimeout(Duration),

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn storage<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Storage(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
