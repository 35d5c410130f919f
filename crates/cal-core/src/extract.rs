//! The structured extraction gateway interface.
//!
//! An [`Extractor`] turns one free-text message into an [`ExtractedRecord`]
//! for a specific day, or reports that the message carries no wellness data.
//! The concrete language-model client lives in `cal-extract`.

use std::future::Future;

use chrono::{DateTime, Days, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::record::ExtractedRecord;

/// Everything the gateway needs to interpret one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRequest {
  pub text:      String,
  /// The submitter's current date.
  pub today:     NaiveDate,
  /// The day before `today`, for resolving "yesterday" and "last night".
  pub yesterday: NaiveDate,
  pub now:       DateTime<FixedOffset>,
}

impl ExtractionRequest {
  /// Build a request for `text` submitted at `now`.
  pub fn new(text: impl Into<String>, now: DateTime<FixedOffset>) -> Self {
    let today = now.date_naive();
    Self {
      text: text.into(),
      today,
      yesterday: today.checked_sub_days(Days::new(1)).unwrap_or(today),
      now,
    }
  }
}

/// The outcome of a successful extraction call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "record", rename_all = "snake_case")]
pub enum Extraction {
  Record(ExtractedRecord),
  /// The message held nothing worth logging. Not an error.
  NotMeaningful,
}

impl Extraction {
  pub fn record(&self) -> Option<&ExtractedRecord> {
    match self {
      Self::Record(r) => Some(r),
      Self::NotMeaningful => None,
    }
  }
}

/// Abstraction over the structured extraction gateway.
///
/// Implementations signal an error when the underlying response cannot be
/// interpreted as a structured record; callers do not retry.
pub trait Extractor: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn extract<'a>(
    &'a self,
    request: &'a ExtractionRequest,
  ) -> impl Future<Output = Result<Extraction, Self::Error>> + Send + 'a;
}
