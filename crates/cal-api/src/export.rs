//! CSV renderings of the journal, served by `?format=download`.
//!
//! Column names match the storage columns. Supplements are written as a JSON
//! array and timestamps as RFC 3339, the same text the store keeps.

use cal_core::{
  field::TextField,
  record::{DailyAggregate, RawMessage},
};
use strum::IntoEnumIterator;

/// Header row of the daily log download.
pub fn day_headers() -> Vec<&'static str> {
  let mut headers = vec!["date"];
  headers.extend(TextField::iter().map(TextField::as_str));
  headers.extend(["supplements", "last_updated"]);
  headers
}

pub const MESSAGE_HEADERS: [&str; 2] = ["timestamp", "message"];

/// Render `days` as CSV, one row per date in the order given.
pub fn days_csv(days: &[DailyAggregate]) -> csv::Result<Vec<u8>> {
  let mut w = csv::Writer::from_writer(Vec::new());
  w.write_record(day_headers())?;

  for day in days {
    let supplements = serde_json::to_string(&day.supplements)
      .map_err(|e| csv::Error::from(std::io::Error::other(e)))?;

    let mut record = Vec::with_capacity(18);
    record.push(day.date.format("%Y-%m-%d").to_string());
    record.extend(TextField::iter().map(|f| day.text(f).to_owned()));
    record.push(supplements);
    record.push(day.last_updated.map(|t| t.to_rfc3339()).unwrap_or_default());
    w.write_record(&record)?;
  }

  finish(w)
}

/// Render raw messages as CSV in append order.
pub fn messages_csv(messages: &[RawMessage]) -> csv::Result<Vec<u8>> {
  let mut w = csv::Writer::from_writer(Vec::new());
  w.write_record(MESSAGE_HEADERS)?;
  for m in messages {
    w.write_record([m.timestamp.to_rfc3339().as_str(), m.message.as_str()])?;
  }
  finish(w)
}

fn finish(w: csv::Writer<Vec<u8>>) -> csv::Result<Vec<u8>> {
  w.into_inner()
    .map_err(|e| csv::Error::from(e.into_error()))
}
