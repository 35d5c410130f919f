//! Read-only views over the journal.
//!
//! `/view` and `/view/raw` answer JSON by default; `?format=download` returns
//! the same data as a CSV attachment.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State, rejection::QueryRejection},
  http::header,
  response::{IntoResponse, Response},
};
use cal_core::{
  extract::Extractor,
  journal::Journal,
  record::{DailyAggregate, RawMessage},
  store::JournalStore,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{error::ApiError, export};

#[derive(Debug, Serialize)]
pub struct Logs<T> {
  pub logs: Vec<T>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewFormat {
  #[default]
  Json,
  Download,
}

#[derive(Debug, Default, Deserialize)]
pub struct ViewParams {
  #[serde(default)]
  pub format: ViewFormat,
}

fn format_of(params: Result<Query<ViewParams>, QueryRejection>) -> Result<ViewFormat, ApiError> {
  params
    .map(|Query(p)| p.format)
    .map_err(|e| ApiError::BadRequest(e.body_text()))
}

fn attachment(filename: &str, body: Vec<u8>) -> Response {
  (
    [
      (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
      (
        header::CONTENT_DISPOSITION,
        format!("attachment; filename=\"{filename}\""),
      ),
    ],
    body,
  )
    .into_response()
}

/// `GET /view[?format=json|download]`
pub async fn list_days<S, X>(
  State(journal): State<Arc<Journal<S, X>>>,
  params: Result<Query<ViewParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: JournalStore,
  X: Extractor,
{
  let format = format_of(params)?;
  let logs = sorted_days(journal.store().as_ref()).await?;
  Ok(match format {
    ViewFormat::Json => Json(Logs { logs }).into_response(),
    ViewFormat::Download => {
      attachment("daily_wellness_logs.csv", export::days_csv(&logs)?)
    }
  })
}

/// `GET /view/raw[?format=json|download]`
pub async fn list_messages<S, X>(
  State(journal): State<Arc<Journal<S, X>>>,
  params: Result<Query<ViewParams>, QueryRejection>,
) -> Result<Response, ApiError>
where
  S: JournalStore,
  X: Extractor,
{
  let format = format_of(params)?;
  let logs: Vec<RawMessage> = journal
    .store()
    .list_messages()
    .await
    .map_err(ApiError::store)?;
  Ok(match format {
    ViewFormat::Json => Json(Logs { logs }).into_response(),
    ViewFormat::Download => {
      attachment("raw_messages.csv", export::messages_csv(&logs)?)
    }
  })
}

/// `GET /view/{date}`, where `date` is `YYYY-MM-DD`.
pub async fn get_day<S, X>(
  State(journal): State<Arc<Journal<S, X>>>,
  Path(date): Path<String>,
) -> Result<Json<DailyAggregate>, ApiError>
where
  S: JournalStore,
  X: Extractor,
{
  let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
    .map_err(|_| ApiError::BadRequest(format!("invalid date {date:?}")))?;

  let day = journal
    .store()
    .get_day(date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no log for {date}")))?;
  Ok(Json(day))
}

/// Every daily aggregate, oldest first.
pub(crate) async fn sorted_days<S: JournalStore>(
  store: &S,
) -> Result<Vec<DailyAggregate>, ApiError> {
  let mut days = store.list_days().await.map_err(ApiError::store)?;
  days.sort_by_key(|d| d.date);
  Ok(days)
}
