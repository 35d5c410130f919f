//! Journal records: raw messages, extracted records and daily aggregates.
//!
//! Raw messages are an append-only log. Extracted records are transient: they
//! are produced by the extraction gateway from one raw message and consumed
//! immediately by the merge engine. Daily aggregates are the only mutable
//! state, one row per calendar date.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::field::TextField;

/// Values the extraction model uses to say "nothing to report".
pub const SENTINEL_VALUES: [&str; 4] = ["-", "n/a", "none", "null"];

// ─── Raw messages ────────────────────────────────────────────────────────────

/// One submitted message, exactly as received (trimmed).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
  /// Local time of submission, with its UTC offset.
  pub timestamp: DateTime<FixedOffset>,
  pub message:   String,
}

/// Trim `text` and return it if anything is left.
///
/// Stores call this before appending; `None` means the message must be
/// rejected without a write.
pub fn normalize_message(text: &str) -> Option<&str> {
  let trimmed = text.trim();
  (!trimmed.is_empty()).then_some(trimmed)
}

// ─── Extracted records ───────────────────────────────────────────────────────

/// The structured fields extracted from one message.
///
/// Only fields the model actually reported are present. Serialises flat, so a
/// record reads like a partial daily row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedFields {
  #[serde(flatten)]
  pub text:        BTreeMap<TextField, String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub supplements: Option<Vec<String>>,
}

impl ExtractedFields {
  pub fn new() -> Self { Self::default() }

  /// Builder-style setter, mostly for tests and the extraction gateway.
  pub fn with(mut self, field: TextField, value: impl Into<String>) -> Self {
    self.text.insert(field, value.into());
    self
  }

  pub fn with_supplements<I, T>(mut self, items: I) -> Self
  where
    I: IntoIterator<Item = T>,
    T: Into<String>,
  {
    self.supplements = Some(items.into_iter().map(Into::into).collect());
    self
  }

  /// `true` when no field holds anything but whitespace.
  ///
  /// The merge engine refuses to touch storage for blank extractions.
  pub fn is_blank(&self) -> bool {
    let text_blank = self.text.values().all(|v| v.trim().is_empty());
    let supplements_blank = self
      .supplements
      .as_ref()
      .is_none_or(|items| items.iter().all(|s| s.trim().is_empty()));
    text_blank && supplements_blank
  }

  /// Whether the fields carry wellness data worth logging.
  ///
  /// A field counts when it is non-empty after trimming and is not one of the
  /// [`SENTINEL_VALUES`]. Mood fields count whenever they are non-empty.
  pub fn is_meaningful(&self) -> bool {
    self.text.iter().any(|(field, value)| {
      let value = value.trim();
      if value.is_empty() {
        return false;
      }
      field.is_mood()
        || !SENTINEL_VALUES
          .iter()
          .any(|sentinel| value.eq_ignore_ascii_case(sentinel))
    })
  }
}

/// Fields extracted from one message, tagged with the day they describe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedRecord {
  pub date:   NaiveDate,
  #[serde(flatten)]
  pub fields: ExtractedFields,
}

// ─── Daily aggregates ────────────────────────────────────────────────────────

/// The merged wellness record for one calendar date.
///
/// Text fields use the empty string for "nothing recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyAggregate {
  pub date:                  NaiveDate,
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
  pub supplements:           Vec<String>,
  /// Time of the most recent merge; `None` only for a freshly synthesised row.
  pub last_updated:          Option<DateTime<FixedOffset>>,
}

impl DailyAggregate {
  /// An empty row for `date`, used when the store has nothing yet.
  pub fn empty(date: NaiveDate) -> Self { Self { date, ..Self::default() } }

  pub fn text(&self, field: TextField) -> &str {
    match field {
      TextField::BreakfastDescription => &self.breakfast_description,
      TextField::LunchDescription => &self.lunch_description,
      TextField::DinnerDescription => &self.dinner_description,
      TextField::SnackDescription => &self.snack_description,
      TextField::MoodMorning => &self.mood_morning,
      TextField::MoodAfternoon => &self.mood_afternoon,
      TextField::MoodNight => &self.mood_night,
      TextField::Hydration => &self.hydration,
      TextField::Sleep => &self.sleep,
      TextField::Activity => &self.activity,
      TextField::Notes => &self.notes,
      TextField::Alcohol => &self.alcohol,
      TextField::Caffeine => &self.caffeine,
      TextField::Marijuana => &self.marijuana,
      TextField::ExerciseType => &self.exercise_type,
    }
  }

  pub fn text_mut(&mut self, field: TextField) -> &mut String {
    match field {
      TextField::BreakfastDescription => &mut self.breakfast_description,
      TextField::LunchDescription => &mut self.lunch_description,
      TextField::DinnerDescription => &mut self.dinner_description,
      TextField::SnackDescription => &mut self.snack_description,
      TextField::MoodMorning => &mut self.mood_morning,
      TextField::MoodAfternoon => &mut self.mood_afternoon,
      TextField::MoodNight => &mut self.mood_night,
      TextField::Hydration => &mut self.hydration,
      TextField::Sleep => &mut self.sleep,
      TextField::Activity => &mut self.activity,
      TextField::Notes => &mut self.notes,
      TextField::Alcohol => &mut self.alcohol,
      TextField::Caffeine => &mut self.caffeine,
      TextField::Marijuana => &mut self.marijuana,
      TextField::ExerciseType => &mut self.exercise_type,
    }
  }
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn normalize_rejects_blank_text() {
    assert_eq!(normalize_message(""), None);
    assert_eq!(normalize_message("  \n\t "), None);
    assert_eq!(normalize_message("  had toast \n"), Some("had toast"));
  }

  #[test]
  fn blank_fields() {
    assert!(ExtractedFields::new().is_blank());
    assert!(
      ExtractedFields::new()
        .with(TextField::Notes, "   ")
        .with_supplements(["", " "])
        .is_blank()
    );
    assert!(
      !ExtractedFields::new()
        .with_supplements(["magnesium"])
        .is_blank()
    );
  }

  #[test]
  fn sentinels_are_not_meaningful() {
    for sentinel in ["-", "N/A", "None", "null", "  none  "] {
      let fields = ExtractedFields::new().with(TextField::Sleep, sentinel);
      assert!(!fields.is_meaningful(), "{sentinel:?} counted as data");
    }
    assert!(
      ExtractedFields::new()
        .with(TextField::Hydration, "2 glasses")
        .is_meaningful()
    );
  }

  #[test]
  fn mood_counts_whenever_non_empty() {
    let fields = ExtractedFields::new().with(TextField::MoodNight, "none");
    assert!(fields.is_meaningful());
    let fields = ExtractedFields::new().with(TextField::MoodNight, " ");
    assert!(!fields.is_meaningful());
  }

  #[test]
  fn text_accessors_cover_every_field() {
    let mut row = DailyAggregate::empty(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    for field in TextField::iter() {
      *row.text_mut(field) = field.as_str().to_owned();
    }
    for field in TextField::iter() {
      assert_eq!(row.text(field), field.as_str());
    }
  }

  #[test]
  fn extracted_record_serialises_flat() {
    let record = ExtractedRecord {
      date:   NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
      fields: ExtractedFields::new()
        .with(TextField::SnackDescription, "apple")
        .with_supplements(["vitamin D"]),
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["date"], "2024-01-01");
    assert_eq!(json["snack_description"], "apple");
    assert_eq!(json["supplements"][0], "vitamin D");
  }
}
