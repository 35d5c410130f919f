//! `GET /recent`: the home-screen summary.

use std::sync::Arc;

use axum::{Json, extract::State};
use cal_core::{
  extract::Extractor,
  journal::Journal,
  record::{DailyAggregate, RawMessage},
  store::JournalStore,
  streak::activity_streak,
};
use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::{error::ApiError, view::sorted_days};

/// How many raw messages the summary includes.
pub const RECENT_MESSAGES: usize = 10;

#[derive(Debug, Serialize)]
pub struct RecentActivity {
  pub recent_messages: Vec<RawMessage>,
  pub today_log:       Option<DailyAggregate>,
  pub daily_logs:      Vec<DailyAggregate>,
  pub activity_streak: u32,
}

/// `GET /recent`
pub async fn handler<S, X>(
  State(journal): State<Arc<Journal<S, X>>>,
) -> Result<Json<RecentActivity>, ApiError>
where
  S: JournalStore,
  X: Extractor,
{
  let summary = summarize(journal.store().as_ref(), Local::now().date_naive()).await?;
  Ok(Json(summary))
}

/// Build the summary as seen on `today`.
pub async fn summarize<S: JournalStore>(
  store: &S,
  today: NaiveDate,
) -> Result<RecentActivity, ApiError> {
  let recent_messages = store
    .recent_messages(RECENT_MESSAGES)
    .await
    .map_err(ApiError::store)?;
  let daily_logs = sorted_days(store).await?;
  let today_log = daily_logs.iter().find(|d| d.date == today).cloned();
  let activity_streak = activity_streak(daily_logs.iter().map(|d| d.date), today);

  Ok(RecentActivity { recent_messages, today_log, daily_logs, activity_streak })
}
