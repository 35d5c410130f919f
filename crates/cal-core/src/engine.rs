//! The merge engine: folds extracted fields into the stored row for a day.
//!
//! Each call loads the current row, applies [`crate::merge::apply`] and
//! upserts the result. Calls for the same date are serialised through a keyed
//! async mutex so two concurrent submissions cannot both read the same stale
//! row; calls for different dates run concurrently.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, PoisonError},
};

use chrono::{DateTime, FixedOffset, Local, NaiveDate};
use serde::Serialize;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, info};

use crate::{
  Error, Result, merge,
  record::{DailyAggregate, ExtractedFields},
  store::JournalStore,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// What a call to [`MergeEngine::merge`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeOutcome {
  /// `false` when the extraction was blank and storage was left untouched.
  pub applied: bool,
  /// The row as persisted; `None` when nothing was applied.
  pub row:     Option<DailyAggregate>,
}

impl MergeOutcome {
  pub fn skipped() -> Self { Self { applied: false, row: None } }
}

// ─── Per-date locks ──────────────────────────────────────────────────────────

/// A lazily-populated map of one async mutex per date.
///
/// Entries are dropped again once nobody holds or waits on them.
#[derive(Default)]
struct DateLocks {
  slots: Mutex<HashMap<NaiveDate, Arc<AsyncMutex<()>>>>,
}

impl DateLocks {
  async fn lock(&self, date: NaiveDate) -> DateGuard<'_> {
    let slot = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      slots.entry(date).or_default().clone()
    };
    DateGuard { locks: self, date, guard: Some(slot.lock_owned().await) }
  }

  /// Forget the lock for `date` if the map holds the only reference.
  fn release(&self, date: NaiveDate) {
    let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    if slots.get(&date).is_some_and(|slot| Arc::strong_count(slot) == 1) {
      slots.remove(&date);
    }
  }

  #[cfg(test)]
  fn len(&self) -> usize {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
  }
}

/// Holds the lock for one date; releases the map entry on drop, including
/// when the merge future is cancelled.
struct DateGuard<'a> {
  locks: &'a DateLocks,
  date:  NaiveDate,
  guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for DateGuard<'_> {
  fn drop(&mut self) {
    self.guard.take();
    self.locks.release(self.date);
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// Merges extractions into the daily aggregate table of `S`.
pub struct MergeEngine<S> {
  store: Arc<S>,
  locks: DateLocks,
}

impl<S: JournalStore> MergeEngine<S> {
  pub fn new(store: Arc<S>) -> Self {
    Self { store, locks: DateLocks::default() }
  }

  pub fn store(&self) -> &Arc<S> { &self.store }

  /// Merge `fields` into the row for `date`, stamping it with the current
  /// local time.
  pub async fn merge(
    &self,
    date: NaiveDate,
    fields: &ExtractedFields,
  ) -> Result<MergeOutcome> {
    self.merge_at(date, fields, Local::now().fixed_offset()).await
  }

  /// As [`Self::merge`], with an explicit `last_updated` timestamp.
  pub async fn merge_at(
    &self,
    date: NaiveDate,
    fields: &ExtractedFields,
    now: DateTime<FixedOffset>,
  ) -> Result<MergeOutcome> {
    if fields.is_blank() {
      debug!(%date, "skipping merge: no field carries data");
      return Ok(MergeOutcome::skipped());
    }

    let guard = self.locks.lock(date).await;
    let result = self.merge_locked(date, fields, now).await;
    drop(guard);

    let row = result?;
    info!(%date, "updated daily log");
    Ok(MergeOutcome { applied: true, row: Some(row) })
  }

  async fn merge_locked(
    &self,
    date: NaiveDate,
    fields: &ExtractedFields,
    now: DateTime<FixedOffset>,
  ) -> Result<DailyAggregate> {
    let existing = self
      .store
      .get_day(date)
      .await
      .map_err(Error::storage)?
      .unwrap_or_else(|| DailyAggregate::empty(date));

    let row = merge::apply(existing, fields, now);

    self.store.upsert_day(&row).await.map_err(Error::storage)?;
    Ok(row)
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

  use super::*;
  use crate::{
    field::TextField,
    record::{RawMessage, normalize_message},
  };

  /// An in-memory [`JournalStore`] that counts reads and writes.
  ///
  /// Setting `fail_reads` or `fail_writes` makes the day operations error.
  #[derive(Default)]
  pub(crate) struct MemoryStore {
    pub messages:    Mutex<Vec<RawMessage>>,
    pub days:        Mutex<HashMap<NaiveDate, DailyAggregate>>,
    pub reads:       AtomicUsize,
    pub writes:      AtomicUsize,
    pub fail_reads:  AtomicBool,
    pub fail_writes: AtomicBool,
  }

  #[derive(Debug, thiserror::Error)]
  #[error("memory store failure")]
  pub(crate) struct MemoryError;

  impl JournalStore for MemoryStore {
    type Error = MemoryError;

    async fn append_message(&self, text: &str) -> Result<Option<RawMessage>, MemoryError> {
      let Some(text) = normalize_message(text) else {
        return Ok(None);
      };
      let message = RawMessage {
        timestamp: Local::now().fixed_offset(),
        message:   text.to_owned(),
      };
      self.messages.lock().unwrap().push(message.clone());
      Ok(Some(message))
    }

    async fn list_messages(&self) -> Result<Vec<RawMessage>, MemoryError> {
      Ok(self.messages.lock().unwrap().clone())
    }

    async fn recent_messages(&self, limit: usize) -> Result<Vec<RawMessage>, MemoryError> {
      let messages = self.messages.lock().unwrap();
      let skip = messages.len().saturating_sub(limit);
      Ok(messages[skip..].to_vec())
    }

    async fn get_day(&self, date: NaiveDate) -> Result<Option<DailyAggregate>, MemoryError> {
      self.reads.fetch_add(1, Ordering::SeqCst);
      // Yield so concurrent merges interleave between read and write.
      tokio::task::yield_now().await;
      if self.fail_reads.load(Ordering::SeqCst) {
        return Err(MemoryError);
      }
      Ok(self.days.lock().unwrap().get(&date).cloned())
    }

    async fn upsert_day(&self, row: &DailyAggregate) -> Result<(), MemoryError> {
      self.writes.fetch_add(1, Ordering::SeqCst);
      if self.fail_writes.load(Ordering::SeqCst) {
        return Err(MemoryError);
      }
      self.days.lock().unwrap().insert(row.date, row.clone());
      Ok(())
    }

    async fn list_days(&self) -> Result<Vec<DailyAggregate>, MemoryError> {
      Ok(self.days.lock().unwrap().values().cloned().collect())
    }
  }

  fn date() -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() }

  fn engine() -> MergeEngine<MemoryStore> {
    MergeEngine::new(Arc::new(MemoryStore::default()))
  }

  #[tokio::test]
  async fn blank_extraction_does_not_touch_storage() {
    let engine = engine();
    let fields = ExtractedFields::new()
      .with(TextField::Notes, "  ")
      .with(TextField::Sleep, "");

    let outcome = engine.merge(date(), &fields).await.unwrap();
    assert_eq!(outcome, MergeOutcome::skipped());
    assert_eq!(engine.store().reads.load(Ordering::SeqCst), 0);
    assert_eq!(engine.store().writes.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn first_merge_creates_row() {
    let engine = engine();
    let fields = ExtractedFields::new().with(TextField::SnackDescription, "apple");

    let outcome = engine.merge(date(), &fields).await.unwrap();
    assert!(outcome.applied);
    let row = outcome.row.unwrap();
    assert_eq!(row.date, date());
    assert_eq!(row.snack_description, "apple");
    assert!(row.last_updated.is_some());

    let stored = engine.store().get_day(date()).await.unwrap().unwrap();
    assert_eq!(stored, row);
  }

  #[tokio::test]
  async fn repeated_merge_is_idempotent() {
    let engine = engine();
    let fields = ExtractedFields::new().with(TextField::SnackDescription, "apple");

    engine.merge(date(), &fields).await.unwrap();
    let outcome = engine.merge(date(), &fields).await.unwrap();
    assert_eq!(outcome.row.unwrap().snack_description, "apple");
  }

  #[tokio::test]
  async fn overwrite_field_reflects_latest_value() {
    let engine = engine();
    engine
      .merge(date(), &ExtractedFields::new().with(TextField::Sleep, "7h"))
      .await
      .unwrap();
    let outcome = engine
      .merge(date(), &ExtractedFields::new().with(TextField::Sleep, "6.5h"))
      .await
      .unwrap();
    assert_eq!(outcome.row.unwrap().sleep, "6.5h");
  }

  #[tokio::test]
  async fn dates_are_kept_apart() {
    let engine = engine();
    let other = date().succ_opt().unwrap();
    let fields = ExtractedFields::new().with(TextField::Notes, "walk");

    engine.merge(date(), &fields).await.unwrap();
    engine.merge(other, &fields).await.unwrap();
    assert_eq!(engine.store().days.lock().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn concurrent_merges_for_one_date_lose_nothing() {
    let engine = Arc::new(engine());
    let items = ["1 glass water", "green tea", "sparkling water", "oat milk latte"];

    let tasks: Vec<_> = items
      .iter()
      .map(|item| {
        let engine = engine.clone();
        let fields = ExtractedFields::new().with(TextField::Hydration, *item);
        tokio::spawn(async move { engine.merge(date(), &fields).await })
      })
      .collect();
    for task in tasks {
      task.await.unwrap().unwrap();
    }

    let row = engine.store().get_day(date()).await.unwrap().unwrap();
    for item in items {
      assert!(row.hydration.contains(item), "{item:?} lost: {}", row.hydration);
    }
    assert_eq!(engine.locks.len(), 0);
  }

  #[tokio::test]
  async fn failed_write_surfaces_as_storage_error_and_releases_lock() {
    let engine = engine();
    let fields = ExtractedFields::new().with(TextField::Notes, "walk");
    engine.store().fail_writes.store(true, Ordering::SeqCst);

    let err = engine.merge(date(), &fields).await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "{err:?}");
    assert_eq!(engine.locks.len(), 0);
    assert!(engine.store().days.lock().unwrap().is_empty());

    engine.store().fail_writes.store(false, Ordering::SeqCst);
    let outcome = engine.merge(date(), &fields).await.unwrap();
    assert_eq!(outcome.row.unwrap().notes, "walk");
  }

  #[tokio::test]
  async fn failed_read_never_writes() {
    let engine = engine();
    engine.store().fail_reads.store(true, Ordering::SeqCst);

    let err = engine
      .merge(date(), &ExtractedFields::new().with(TextField::Sleep, "7h"))
      .await
      .unwrap_err();
    assert!(matches!(err, Error::Storage(_)), "{err:?}");
    assert_eq!(engine.store().writes.load(Ordering::SeqCst), 0);
    assert_eq!(engine.locks.len(), 0);
  }
}
