//! [`SqliteStore`]: the SQLite implementation of [`JournalStore`].

use std::path::Path;

use cal_core::{
  record::{DailyAggregate, RawMessage, normalize_message},
  store::JournalStore,
};
use chrono::{Local, NaiveDate};
use rusqlite::OptionalExtension as _;

use crate::{
  Result,
  encode::{RawDay, RawMessageRow, encode_date, encode_dt},
  schema::{DAY_COLUMNS, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cal journal store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  ///
  /// Missing parent directories are created.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  #[cfg(test)]
  pub(crate) fn conn_for_tests(&self) -> &tokio_rusqlite::Connection {
    &self.conn
  }

  async fn query_messages(
    &self,
    sql: &'static str,
    limit: i64,
  ) -> Result<Vec<RawMessage>> {
    let raws: Vec<RawMessageRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
          .query_map(rusqlite::params![limit], |row| {
            Ok(RawMessageRow {
              timestamp: row.get(0)?,
              message:   row.get(1)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(raws.into_iter().filter_map(RawMessageRow::into_message).collect())
  }
}

// ─── JournalStore impl ───────────────────────────────────────────────────────

impl JournalStore for SqliteStore {
  type Error = crate::Error;

  // ── Raw messages ──────────────────────────────────────────────────────────

  async fn append_message(&self, text: &str) -> Result<Option<RawMessage>> {
    let Some(text) = normalize_message(text) else {
      return Ok(None);
    };

    let message = RawMessage {
      timestamp: Local::now().fixed_offset(),
      message:   text.to_owned(),
    };

    let at_str  = encode_dt(message.timestamp);
    let msg_str = message.message.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO raw_messages (timestamp, message) VALUES (?1, ?2)",
          rusqlite::params![at_str, msg_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(message))
  }

  async fn list_messages(&self) -> Result<Vec<RawMessage>> {
    // SQLite treats a negative LIMIT as "no limit".
    self
      .query_messages(
        "SELECT timestamp, message FROM raw_messages ORDER BY id LIMIT ?1",
        -1,
      )
      .await
  }

  async fn recent_messages(&self, limit: usize) -> Result<Vec<RawMessage>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    self
      .query_messages(
        "SELECT timestamp, message FROM (
           SELECT id, timestamp, message FROM raw_messages
           WHERE trim(timestamp) != '' AND trim(message) != ''
           ORDER BY id DESC
           LIMIT ?1
         ) ORDER BY id",
        limit,
      )
      .await
  }

  // ── Daily aggregates ──────────────────────────────────────────────────────

  async fn get_day(&self, date: NaiveDate) -> Result<Option<DailyAggregate>> {
    let date_str = encode_date(date);

    let raw: Option<RawDay> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {DAY_COLUMNS} FROM daily_logs WHERE date = ?1"),
              rusqlite::params![date_str],
              RawDay::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDay::into_aggregate).transpose()
  }

  async fn upsert_day(&self, row: &DailyAggregate) -> Result<()> {
    let raw = RawDay::from_aggregate(row)?;

    // A single statement, so a failed write leaves the previous row intact.
    self
      .conn
      .call(move |conn| {
        conn.execute(
          &format!(
            "INSERT OR REPLACE INTO daily_logs ({DAY_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
                     ?14, ?15, ?16, ?17, ?18)"
          ),
          rusqlite::params![
            raw.date,
            raw.breakfast_description,
            raw.lunch_description,
            raw.dinner_description,
            raw.snack_description,
            raw.mood_morning,
            raw.mood_afternoon,
            raw.mood_night,
            raw.hydration,
            raw.sleep,
            raw.activity,
            raw.notes,
            raw.alcohol,
            raw.caffeine,
            raw.marijuana,
            raw.exercise_type,
            raw.supplements,
            raw.last_updated,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_days(&self) -> Result<Vec<DailyAggregate>> {
    let raws: Vec<RawDay> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {DAY_COLUMNS} FROM daily_logs"))?;
        let rows = stmt
          .query_map([], RawDay::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDay::into_aggregate).collect()
  }
}
