//! The submission pipeline: raw log → extraction → merge.
//!
//! The raw message is committed before extraction is attempted, so a failed
//! or timed-out extraction never loses what the user typed.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, FixedOffset, Local};
use serde::Serialize;
use tracing::{info, warn};

use crate::{
  Error, Result,
  engine::{MergeEngine, MergeOutcome},
  extract::{Extraction, ExtractionRequest, Extractor},
  record::RawMessage,
  store::JournalStore,
};

/// Default upper bound on one extraction call.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything that happened to one submitted message.
#[derive(Debug, Clone, Serialize)]
pub struct Submission {
  pub message:    RawMessage,
  pub extraction: Extraction,
  pub merge:      MergeOutcome,
}

/// Owns the store, the extraction gateway and the merge engine.
pub struct Journal<S, X> {
  engine:    MergeEngine<S>,
  extractor: Arc<X>,
  timeout:   Duration,
}

impl<S, X> Journal<S, X>
where
  S: JournalStore,
  X: Extractor,
{
  pub fn new(store: Arc<S>, extractor: Arc<X>) -> Self {
    Self {
      engine: MergeEngine::new(store),
      extractor,
      timeout: DEFAULT_EXTRACTION_TIMEOUT,
    }
  }

  /// Bound each extraction call by `timeout` instead of the default.
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  pub fn store(&self) -> &Arc<S> { self.engine.store() }

  pub fn engine(&self) -> &MergeEngine<S> { &self.engine }

  /// Log `text`, extract structured fields and merge them into the day they
  /// describe.
  pub async fn submit(&self, text: &str) -> Result<Submission> {
    self.submit_at(text, Local::now().fixed_offset()).await
  }

  /// As [`Self::submit`], as if submitted at `now`.
  pub async fn submit_at(
    &self,
    text: &str,
    now: DateTime<FixedOffset>,
  ) -> Result<Submission> {
    let message = self
      .store()
      .append_message(text)
      .await
      .map_err(Error::storage)?
      .ok_or(Error::EmptyMessage)?;

    let request = ExtractionRequest::new(message.message.clone(), now);
    let extraction =
      match tokio::time::timeout(self.timeout, self.extractor.extract(&request))
        .await
      {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => {
          warn!(error = %e, "extraction failed");
          return Err(Error::Extraction(Box::new(e)));
        }
        Err(_) => {
          warn!(timeout = ?self.timeout, "extraction timed out");
          return Err(Error::ExtractionTimeout(self.timeout));
        }
      };

    let merge = match &extraction {
      Extraction::Record(record) => {
        self.engine.merge_at(record.date, &record.fields, now).await?
      }
      Extraction::NotMeaningful => {
        info!("no meaningful wellness data; daily log unchanged");
        MergeOutcome::skipped()
      }
    };

    Ok(Submission { message, extraction, merge })
  }
}
