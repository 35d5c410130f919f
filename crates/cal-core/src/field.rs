//! The wellness field taxonomy.
//!
//! Every free-text column of a daily aggregate is a [`TextField`]. Each field
//! carries a [`MergePolicy`] that decides how a newly extracted value combines
//! with what is already stored for the day. Supplements are the one list
//! field and are handled separately as a set union.

use serde::{Deserialize, Serialize};
use strum::{EnumIter, EnumString, IntoStaticStr};

/// How a new value for a field combines with the stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePolicy {
  /// Values accumulate over the day, with substring-aware deduplication.
  Append,
  /// The latest non-empty value replaces the stored one.
  Overwrite,
}

/// A free-text column of the daily aggregate.
///
/// The `snake_case` names double as the storage column names and the JSON
/// keys of the API.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  EnumIter,
  EnumString,
  IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TextField {
  // ── Meals ───────────────────────────────────────────────────────────────
  BreakfastDescription,
  LunchDescription,
  DinnerDescription,
  SnackDescription,

  // ── Mood ────────────────────────────────────────────────────────────────
  MoodMorning,
  MoodAfternoon,
  MoodNight,

  // ── Habits ──────────────────────────────────────────────────────────────
  Hydration,
  Sleep,
  Activity,
  Notes,
  Alcohol,
  Caffeine,
  Marijuana,
  ExerciseType,
}

impl TextField {
  /// The column / JSON key for this field.
  pub fn as_str(self) -> &'static str { self.into() }

  /// Point-in-time fields overwrite; everything else appends.
  pub fn policy(self) -> MergePolicy {
    match self {
      Self::Sleep
      | Self::MoodMorning
      | Self::MoodAfternoon
      | Self::MoodNight
      | Self::Alcohol
      | Self::Caffeine
      | Self::Marijuana
      | Self::ExerciseType => MergePolicy::Overwrite,
      _ => MergePolicy::Append,
    }
  }

  pub fn is_mood(self) -> bool {
    matches!(self, Self::MoodMorning | Self::MoodAfternoon | Self::MoodNight)
  }
}
