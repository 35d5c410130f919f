//! `POST /log`: record a message and merge what it says into its day.
//!
//! The raw message is saved before extraction runs, so a 502 still leaves it
//! in the log.

use std::sync::Arc;

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use cal_core::{
  extract::{Extraction, Extractor},
  journal::Journal,
  record::ExtractedRecord,
  store::JournalStore,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Merged,
  NotMeaningful,
}

/// Body returned for an accepted message.
#[derive(Debug, Serialize)]
pub struct LogResponse {
  pub status:            &'static str,
  pub outcome:           Outcome,
  /// The extracted record, or `null` when nothing meaningful was found.
  pub data:              Option<ExtractedRecord>,
  pub daily_log_updated: bool,
  pub raw_message_saved: bool,
}

/// `POST /log` with body `{"input":"..."}`
pub async fn handler<S, X>(
  State(journal): State<Arc<Journal<S, X>>>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<LogResponse>, ApiError>
where
  S: JournalStore,
  X: Extractor,
{
  let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let input = body
    .get("input")
    .and_then(Value::as_str)
    .ok_or_else(|| ApiError::BadRequest("`input` must be a string".into()))?;

  let submission = journal.submit(input).await?;

  let (outcome, data) = match submission.extraction {
    Extraction::Record(record) => (Outcome::Merged, Some(record)),
    Extraction::NotMeaningful => (Outcome::NotMeaningful, None),
  };

  Ok(Json(LogResponse {
    status: "success",
    outcome,
    data,
    daily_log_updated: submission.merge.applied,
    raw_message_saved: true,
  }))
}
