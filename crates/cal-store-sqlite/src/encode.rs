//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD`, timestamps as RFC 3339 strings with their
//! UTC offset, and the supplements list as a compact JSON array. This module
//! is the only place those string encodings exist.

use cal_core::record::{DailyAggregate, RawMessage};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime};
use tracing::warn;

use crate::{Error, Result};

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── DateTime<FixedOffset> ───────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<FixedOffset>) -> String { dt.to_rfc3339() }

/// Read a stored timestamp.
///
/// Older rows were written without an offset; those are read as local time.
pub fn decode_timestamp(s: &str) -> Option<DateTime<FixedOffset>> {
  let s = s.trim();
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt);
  }
  NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
    .ok()
    .and_then(|naive| naive.and_local_timezone(Local).earliest())
    .map(|dt| dt.fixed_offset())
}

/// Decode a `last_updated` cell. Anything unreadable degrades to `None`
/// rather than failing the row.
pub fn decode_last_updated(s: &str) -> Option<DateTime<FixedOffset>> {
  if s.trim().is_empty() {
    return None;
  }
  let dt = decode_timestamp(s);
  if dt.is_none() {
    warn!(value = s, "unreadable last_updated; treating as unset");
  }
  dt
}

// ─── Supplements ─────────────────────────────────────────────────────────────

pub fn encode_supplements(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

/// Decode the stored supplements cell.
///
/// Accepts the canonical JSON array and the legacy comma-joined form. A cell
/// that cannot be read is treated as an empty list.
pub fn decode_supplements(s: &str) -> Vec<String> {
  let s = s.trim();
  if s.is_empty() {
    return Vec::new();
  }

  if s.starts_with('[') {
    return match serde_json::from_str::<Vec<String>>(s) {
      Ok(items) => items,
      Err(e) => {
        warn!(value = s, error = %e, "malformed supplements; treating as empty");
        Vec::new()
      }
    };
  }

  s.split(',')
    .map(str::trim)
    .filter(|item| !item.is_empty())
    .map(str::to_owned)
    .collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `raw_messages` row.
pub struct RawMessageRow {
  pub timestamp: String,
  pub message:   String,
}

impl RawMessageRow {
  /// `None`, with a warning, when the timestamp cannot be read; callers skip
  /// such rows instead of failing the whole listing.
  pub fn into_message(self) -> Option<RawMessage> {
    let Some(timestamp) = decode_timestamp(&self.timestamp) else {
      warn!(value = %self.timestamp, "unreadable raw message timestamp; skipping row");
      return None;
    };
    Some(RawMessage { timestamp, message: self.message })
  }
}

/// Raw strings read directly from a `daily_logs` row, in column order.
pub struct RawDay {
  pub date:                  String,
  pub breakfast_description: String,
  pub lunch_description:     String,
  pub dinner_description:    String,
  pub snack_description:     String,
  pub mood_morning:          String,
  pub mood_afternoon:        String,
  pub mood_night:            String,
  pub hydration:             String,
  pub sleep:                 String,
  pub activity:              String,
  pub notes:                 String,
  pub alcohol:               String,
  pub caffeine:              String,
  pub marijuana:             String,
  pub exercise_type:         String,
  pub supplements:           String,
  pub last_updated:          String,
}

impl RawDay {
  /// Read a row selected with [`crate::schema::DAY_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      date:                  row.get(0)?,
      breakfast_description: row.get(1)?,
      lunch_description:     row.get(2)?,
      dinner_description:    row.get(3)?,
      snack_description:     row.get(4)?,
      mood_morning:          row.get(5)?,
      mood_afternoon:        row.get(6)?,
      mood_night:            row.get(7)?,
      hydration:             row.get(8)?,
      sleep:                 row.get(9)?,
      activity:              row.get(10)?,
      notes:                 row.get(11)?,
      alcohol:               row.get(12)?,
      caffeine:              row.get(13)?,
      marijuana:             row.get(14)?,
      exercise_type:         row.get(15)?,
      supplements:           row.get(16)?,
      last_updated:          row.get(17)?,
    })
  }

  pub fn from_aggregate(day: &DailyAggregate) -> Result<Self> {
    Ok(Self {
      date:                  encode_date(day.date),
      breakfast_description: day.breakfast_description.clone(),
      lunch_description:     day.lunch_description.clone(),
      dinner_description:    day.dinner_description.clone(),
      snack_description:     day.snack_description.clone(),
      mood_morning:          day.mood_morning.clone(),
      mood_afternoon:        day.mood_afternoon.clone(),
      mood_night:            day.mood_night.clone(),
      hydration:             day.hydration.clone(),
      sleep:                 day.sleep.clone(),
      activity:              day.activity.clone(),
      notes:                 day.notes.clone(),
      alcohol:               day.alcohol.clone(),
      caffeine:              day.caffeine.clone(),
      marijuana:             day.marijuana.clone(),
      exercise_type:         day.exercise_type.clone(),
      supplements:           encode_supplements(&day.supplements)?,
      last_updated:          day.last_updated.map(encode_dt).unwrap_or_default(),
    })
  }

  pub fn into_aggregate(self) -> Result<DailyAggregate> {
    Ok(DailyAggregate {
      date:                  decode_date(&self.date)?,
      breakfast_description: self.breakfast_description,
      lunch_description:     self.lunch_description,
      dinner_description:    self.dinner_description,
      snack_description:     self.snack_description,
      mood_morning:          self.mood_morning,
      mood_afternoon:        self.mood_afternoon,
      mood_night:            self.mood_night,
      hydration:             self.hydration,
      sleep:                 self.sleep,
      activity:              self.activity,
      notes:                 self.notes,
      alcohol:               self.alcohol,
      caffeine:              self.caffeine,
      marijuana:             self.marijuana,
      exercise_type:         self.exercise_type,
      supplements:           decode_supplements(&self.supplements),
      last_updated:          decode_last_updated(&self.last_updated),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn supplements_json_array() {
    assert_eq!(
      decode_supplements(r#"["vitamin D", "magnesium"]"#),
      ["vitamin D", "magnesium"]
    );
    assert!(decode_supplements("[]").is_empty());
  }

  #[test]
  fn supplements_legacy_comma_joined() {
    assert_eq!(
      decode_supplements("vitamin D, magnesium,zinc"),
      ["vitamin D", "magnesium", "zinc"]
    );
  }

  #[test]
  fn malformed_supplements_degrade_to_empty() {
    assert!(decode_supplements("[\"vitamin D\"").is_empty());
    assert!(decode_supplements("[1, 2]").is_empty());
    assert!(decode_supplements("   ").is_empty());
  }

  #[test]
  fn raw_message_rows_with_unreadable_timestamps_are_dropped() {
    let legacy = RawMessageRow {
      timestamp: "2024-01-01T08:30:00".into(),
      message:   "coffee".into(),
    };
    let msg = legacy.into_message().unwrap();
    assert_eq!(msg.timestamp.naive_local().to_string(), "2024-01-01 08:30:00");

    let broken = RawMessageRow { timestamp: "last week".into(), message: "x".into() };
    assert!(broken.into_message().is_none());
  }

  #[test]
  fn last_updated_accepts_offsetless_legacy_values() {
    let dt = decode_last_updated("2024-01-01T08:30:00.123456").unwrap();
    assert_eq!(dt.naive_local().to_string(), "2024-01-01 08:30:00.123456");
    assert!(decode_last_updated("").is_none());
    assert!(decode_last_updated("yesterday-ish").is_none());
  }

  #[test]
  fn dates_use_iso_calendar_format() {
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(encode_date(date), "2024-02-29");
    assert_eq!(decode_date("2024-02-29").unwrap(), date);
    assert!(matches!(decode_date("29/02/2024"), Err(Error::DateParse(_))));
  }
}
