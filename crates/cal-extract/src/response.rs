//! Interpreting the model's answer.
//!
//! The model is asked for the grouped shape of
//! [`crate::prompt::response_schema`]. Flat answers that use the storage column
//! names directly (`"snack_description": "..."`) are accepted too. Scalar
//! values of any JSON type are read as text; `null` and empty strings are
//! dropped.

use cal_core::{
  extract::{Extraction, ExtractionRequest},
  field::TextField,
  record::{ExtractedFields, ExtractedRecord},
};
use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::{Error, Result};

/// `(group, key, field)` for every grouped location a field may appear in.
const GROUPED: &[(&str, &str, TextField)] = &[
  ("meals", "breakfast", TextField::BreakfastDescription),
  ("meals", "lunch", TextField::LunchDescription),
  ("meals", "dinner", TextField::DinnerDescription),
  ("meals", "snack", TextField::SnackDescription),
  ("meals", "snacks", TextField::SnackDescription),
  ("mood", "morning", TextField::MoodMorning),
  ("mood", "afternoon", TextField::MoodAfternoon),
  ("mood", "night", TextField::MoodNight),
  ("mood", "evening", TextField::MoodNight),
  ("habits", "hydration", TextField::Hydration),
  ("habits", "sleep", TextField::Sleep),
  ("habits", "activity", TextField::Activity),
  ("habits", "exercise_type", TextField::ExerciseType),
  ("habits", "alcohol", TextField::Alcohol),
  ("habits", "caffeine", TextField::Caffeine),
  ("habits", "marijuana", TextField::Marijuana),
];

/// Turn the model's text answer into an [`Extraction`].
pub fn parse_response(text: &str, request: &ExtractionRequest) -> Result<Extraction> {
  let body = json_body(text).ok_or(Error::NotAnObject)?;
  let Value::Object(root) = serde_json::from_str::<Value>(body)? else {
    return Err(Error::NotAnObject);
  };

  let date = match root.get("date").and_then(as_text) {
    Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
      .map_err(|_| Error::InvalidDate(s))?,
    None => request.today,
  };

  let fields = extract_fields(&root);

  if root.get("meaningful").and_then(Value::as_bool) == Some(false)
    || !fields.is_meaningful()
  {
    return Ok(Extraction::NotMeaningful);
  }

  Ok(Extraction::Record(ExtractedRecord { date, fields }))
}

fn extract_fields(root: &Map<String, Value>) -> ExtractedFields {
  let mut fields = ExtractedFields::new();

  // Flat column names first so grouped values win when both are present.
  for (key, value) in root {
    if let Ok(field) = key.parse::<TextField>()
      && let Some(text) = as_text(value)
    {
      fields.text.insert(field, text);
    }
  }

  for (group, key, field) in GROUPED {
    if let Some(text) = root
      .get(*group)
      .and_then(|g| g.get(*key))
      .and_then(as_text)
    {
      fields.text.insert(*field, text);
    }
  }

  let supplements = root
    .get("habits")
    .and_then(|h| h.get("supplements"))
    .or_else(|| root.get("supplements"))
    .map(as_list);
  if let Some(items) = supplements
    && !items.is_empty()
  {
    fields.supplements = Some(items);
  }

  fields
}

/// Strip Markdown code fences and any prose around the outermost object.
fn json_body(text: &str) -> Option<&str> {
  let start = text.find('{')?;
  let end = text.rfind('}')?;
  (start < end).then(|| &text[start..=end])
}

fn as_text(value: &Value) -> Option<String> {
  let text = match value {
    Value::String(s) => s.trim().to_owned(),
    Value::Number(n) => n.to_string(),
    Value::Bool(b) => b.to_string(),
    Value::Array(_) => as_list(value).join(", "),
    Value::Null | Value::Object(_) => return None,
  };
  (!text.is_empty()).then_some(text)
}

fn as_list(value: &Value) -> Vec<String> {
  match value {
    Value::Array(items) => items.iter().filter_map(as_text).collect(),
    Value::String(s) => s
      .split(',')
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_owned)
      .collect(),
    _ => Vec::new(),
  }
}
