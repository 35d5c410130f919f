//! Integration tests for `SqliteStore` against an in-memory database.

use std::sync::Arc;

use cal_core::{
  engine::MergeEngine,
  field::TextField,
  record::{DailyAggregate, ExtractedFields},
  store::JournalStore,
};
use chrono::{DateTime, NaiveDate};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn date(day: u32) -> NaiveDate { NaiveDate::from_ymd_opt(2024, 1, day).unwrap() }

// ─── Raw messages ────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_trims_and_stamps_message() {
  let s = store().await;

  let msg = s.append_message("  had oatmeal \n").await.unwrap().unwrap();
  assert_eq!(msg.message, "had oatmeal");

  let all = s.list_messages().await.unwrap();
  assert_eq!(all, vec![msg]);
}

#[tokio::test]
async fn append_rejects_blank_text_without_writing() {
  let s = store().await;

  assert!(s.append_message("").await.unwrap().is_none());
  assert!(s.append_message(" \t\n ").await.unwrap().is_none());
  assert!(s.list_messages().await.unwrap().is_empty());
}

#[tokio::test]
async fn messages_keep_append_order() {
  let s = store().await;
  for text in ["first", "second", "third"] {
    s.append_message(text).await.unwrap();
  }

  let texts: Vec<String> = s
    .list_messages()
    .await
    .unwrap()
    .into_iter()
    .map(|m| m.message)
    .collect();
  assert_eq!(texts, ["first", "second", "third"]);
}

#[tokio::test]
async fn recent_messages_returns_tail_oldest_first() {
  let s = store().await;
  for i in 0..12 {
    s.append_message(&format!("message {i}")).await.unwrap();
  }

  let recent = s.recent_messages(10).await.unwrap();
  assert_eq!(recent.len(), 10);
  assert_eq!(recent[0].message, "message 2");
  assert_eq!(recent[9].message, "message 11");

  assert_eq!(s.recent_messages(100).await.unwrap().len(), 12);
}

#[tokio::test]
async fn unreadable_timestamps_are_skipped_not_fatal() {
  let s = store().await;
  s.append_message("first").await.unwrap();
  s.conn_for_tests()
    .call(|conn| {
      conn.execute(
        "INSERT INTO raw_messages (timestamp, message) VALUES
           ('2024-01-01T08:30:00.250000', 'legacy'),
           ('sometime tuesday', 'garbled')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();
  s.append_message("last").await.unwrap();

  let texts: Vec<String> =
    s.list_messages().await.unwrap().into_iter().map(|m| m.message).collect();
  assert_eq!(texts, ["first", "legacy", "last"]);

  let recent = s.recent_messages(10).await.unwrap();
  assert_eq!(recent.len(), 3);
}

// ─── Daily aggregates ────────────────────────────────────────────────────────

fn full_row() -> DailyAggregate {
  DailyAggregate {
    date:                  date(1),
    breakfast_description: "oatmeal with berries".into(),
    lunch_description:     "lentil soup".into(),
    dinner_description:    "salmon, rice".into(),
    snack_description:     "spicy chips".into(),
    mood_morning:          "groggy".into(),
    mood_afternoon:        "focused".into(),
    mood_night:            "calm".into(),
    hydration:             "1 glass water, 1 cup coffee".into(),
    sleep:                 "6.5h".into(),
    activity:              "walked 5k steps".into(),
    notes:                 "headache in the evening".into(),
    alcohol:               "1 beer".into(),
    caffeine:              "2 coffees".into(),
    marijuana:             "none".into(),
    exercise_type:         "walking".into(),
    supplements:           vec!["vitamin D".into(), "magnesium".into()],
    last_updated:          Some(
      DateTime::parse_from_rfc3339("2024-01-01T21:15:00+01:00").unwrap(),
    ),
  }
}

#[tokio::test]
async fn get_day_missing_returns_none() {
  let s = store().await;
  assert!(s.get_day(date(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn day_round_trips_field_for_field() {
  let s = store().await;
  let row = full_row();

  s.upsert_day(&row).await.unwrap();
  let fetched = s.get_day(row.date).await.unwrap().unwrap();
  assert_eq!(fetched, row);
}

#[tokio::test]
async fn upsert_replaces_whole_row() {
  let s = store().await;
  s.upsert_day(&full_row()).await.unwrap();

  let mut replacement = DailyAggregate::empty(date(1));
  replacement.notes = "only notes".into();
  s.upsert_day(&replacement).await.unwrap();

  let fetched = s.get_day(date(1)).await.unwrap().unwrap();
  assert_eq!(fetched, replacement);
  assert!(fetched.supplements.is_empty());
  assert_eq!(s.list_days().await.unwrap().len(), 1);
}

#[tokio::test]
async fn empty_supplements_stored_as_json_array() {
  let s = store().await;
  s.upsert_day(&DailyAggregate::empty(date(2))).await.unwrap();

  let stored: String = s
    .conn_for_tests()
    .call(|conn| {
      Ok(conn.query_row(
        "SELECT supplements FROM daily_logs WHERE date = '2024-01-02'",
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap();
  assert_eq!(stored, "[]");
}

#[tokio::test]
async fn legacy_supplements_cell_is_read_leniently() {
  let s = store().await;
  s.conn_for_tests()
    .call(|conn| {
      conn.execute(
        "INSERT INTO daily_logs (date, supplements) VALUES ('2024-01-03', 'fish oil, zinc')",
        [],
      )?;
      conn.execute(
        "INSERT INTO daily_logs (date, supplements) VALUES ('2024-01-04', '[broken')",
        [],
      )?;
      Ok(())
    })
    .await
    .unwrap();

  let legacy = s.get_day(date(3)).await.unwrap().unwrap();
  assert_eq!(legacy.supplements, ["fish oil", "zinc"]);
  assert!(legacy.last_updated.is_none());

  let broken = s.get_day(date(4)).await.unwrap().unwrap();
  assert!(broken.supplements.is_empty());
}

#[tokio::test]
async fn list_days_returns_every_date() {
  let s = store().await;
  for day in [3, 1, 2] {
    s.upsert_day(&DailyAggregate::empty(date(day))).await.unwrap();
  }

  let mut dates: Vec<NaiveDate> =
    s.list_days().await.unwrap().into_iter().map(|d| d.date).collect();
  dates.sort();
  assert_eq!(dates, [date(1), date(2), date(3)]);
}

// ─── Merge engine over SQLite ────────────────────────────────────────────────

#[tokio::test]
async fn merge_engine_accumulates_across_calls() {
  let engine = MergeEngine::new(Arc::new(store().await));

  engine
    .merge(date(1), &ExtractedFields::new().with(TextField::SnackDescription, "chips"))
    .await
    .unwrap();
  engine
    .merge(
      date(1),
      &ExtractedFields::new()
        .with(TextField::SnackDescription, "spicy chips")
        .with_supplements(["vitamin D"]),
    )
    .await
    .unwrap();
  engine
    .merge(
      date(1),
      &ExtractedFields::new().with_supplements(["vitamin D", "magnesium"]),
    )
    .await
    .unwrap();

  let row = engine.store().get_day(date(1)).await.unwrap().unwrap();
  assert_eq!(row.snack_description, "spicy chips");
  assert_eq!(row.supplements, ["vitamin D", "magnesium"]);
}

#[tokio::test]
async fn blank_merge_leaves_table_untouched() {
  let engine = MergeEngine::new(Arc::new(store().await));
  engine.store().upsert_day(&full_row()).await.unwrap();

  let outcome = engine
    .merge(date(1), &ExtractedFields::new().with(TextField::Notes, "   "))
    .await
    .unwrap();
  assert!(!outcome.applied);
  assert_eq!(engine.store().get_day(date(1)).await.unwrap().unwrap(), full_row());
}
