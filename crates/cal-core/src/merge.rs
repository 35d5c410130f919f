//! Per-field merge policy.
//!
//! These functions are pure: they take the stored row and a fresh extraction
//! and compute the next row. Loading, locking and persisting live in
//! [`crate::engine`].

use chrono::{DateTime, FixedOffset};
use tracing::debug;

use crate::{
  field::{MergePolicy, TextField},
  record::{DailyAggregate, ExtractedFields},
};

/// Items shorter than this never count as near-duplicates of each other.
const MIN_SIMILAR_LEN: usize = 4;

/// Combine a stored value with a newly extracted one for `field`.
///
/// Blank sides defer to the other side. Overwrite fields take the new value.
/// Append fields deduplicate, in order:
///
/// 1. new already contained in existing → existing;
/// 2. existing contained in new → new;
/// 3. the first comma-separated item of existing that is a near-duplicate of
///    new is replaced by new when new is longer, otherwise existing is kept;
/// 4. otherwise new is appended after `", "`.
///
/// All containment checks are case-insensitive.
pub fn merge_field(existing: &str, new: &str, field: TextField) -> String {
  if existing.trim().is_empty() {
    return new.to_owned();
  }
  if new.trim().is_empty() {
    return existing.to_owned();
  }

  let existing = existing.trim();
  let new = new.trim();

  if field.policy() == MergePolicy::Overwrite {
    return new.to_owned();
  }

  let existing_lower = existing.to_lowercase();
  let new_lower = new.to_lowercase();

  if existing_lower.contains(&new_lower) {
    return existing.to_owned();
  }
  if new_lower.contains(&existing_lower) {
    return new.to_owned();
  }

  let mut items: Vec<&str> = existing.split(',').map(str::trim).collect();
  let new_len = new_lower.chars().count();

  for idx in 0..items.len() {
    let item_lower = items[idx].to_lowercase();
    let item_len = item_lower.chars().count();

    let similar = (new_len >= MIN_SIMILAR_LEN && item_lower.contains(&new_lower))
      || (item_len >= MIN_SIMILAR_LEN && new_lower.contains(&item_lower));
    if !similar {
      continue;
    }

    // Only the first near-duplicate is considered.
    if new.chars().count() > items[idx].chars().count() {
      items[idx] = new;
      return items.join(", ");
    }
    return existing.to_owned();
  }

  format!("{existing}, {new}")
}

/// Set union of two supplement lists.
///
/// Keeps first-seen order (stored items, then new ones), drops blank entries
/// and exact duplicates.
pub fn merge_supplements(existing: &[String], new: &[String]) -> Vec<String> {
  let mut merged: Vec<String> = Vec::with_capacity(existing.len() + new.len());
  for item in existing.iter().chain(new) {
    let item = item.trim();
    if item.is_empty() || merged.iter().any(|m| m == item) {
      continue;
    }
    merged.push(item.to_owned());
  }
  merged
}

/// Fold `fields` into `row` and stamp it with `now`.
pub fn apply(
  mut row: DailyAggregate,
  fields: &ExtractedFields,
  now: DateTime<FixedOffset>,
) -> DailyAggregate {
  for (&field, value) in &fields.text {
    let slot = row.text_mut(field);
    let merged = merge_field(slot, value, field);
    debug!(
      field = field.as_str(),
      existing = slot.as_str(),
      incoming = value.as_str(),
      merged = merged.as_str(),
      "merged field"
    );
    *slot = merged;
  }

  if let Some(new) = &fields.supplements {
    let merged = merge_supplements(&row.supplements, new);
    debug!(?merged, "merged supplements");
    row.supplements = merged;
  }

  row.last_updated = Some(now);
  row
}
