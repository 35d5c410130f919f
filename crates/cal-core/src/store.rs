//! The `JournalStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `cal-store-sqlite`).
//! Higher layers (`cal-api`, `cal-server`) and the merge engine depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use chrono::NaiveDate;

use crate::record::{DailyAggregate, RawMessage};

/// Abstraction over the journal's durable state: an append-only raw message
/// log and a table of daily aggregates keyed by date.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait JournalStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Raw messages (append-only) ───────────────────────────────────────

  /// Append a message to the raw log.
  ///
  /// The text is trimmed before it is stored and the timestamp is assigned by
  /// the store. Returns `None`, without writing anything, when the text is
  /// empty or whitespace-only.
  fn append_message<'a>(
    &'a self,
    text: &'a str,
  ) -> impl Future<Output = Result<Option<RawMessage>, Self::Error>> + Send + 'a;

  /// All raw messages in append order.
  fn list_messages(
    &self,
  ) -> impl Future<Output = Result<Vec<RawMessage>, Self::Error>> + Send + '_;

  /// The last `limit` raw messages, oldest first.
  fn recent_messages(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<RawMessage>, Self::Error>> + Send + '_;

  // ── Daily aggregates ──────────────────────────────────────────────────

  /// Retrieve the aggregate for `date`. Returns `None` if nothing has been
  /// merged for that date yet.
  fn get_day(
    &self,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyAggregate>, Self::Error>> + Send + '_;

  /// Insert or fully replace the row for `row.date`.
  fn upsert_day<'a>(
    &'a self,
    row: &'a DailyAggregate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// All daily aggregates. Order is not guaranteed.
  fn list_days(
    &self,
  ) -> impl Future<Output = Result<Vec<DailyAggregate>, Self::Error>> + Send + '_;
}
