//! Structured extraction gateway backed by the Anthropic Messages API.
//!
//! [`AnthropicExtractor`] implements [`cal_core::extract::Extractor`]: it sends
//! one prompt per message, asking the model to answer with a JSON object that
//! follows [`prompt::response_schema`], and turns the answer into an
//! [`cal_core::extract::Extraction`].

mod client;
mod error;
pub mod prompt;
pub mod response;

pub use client::{AnthropicExtractor, ExtractorConfig};
pub use error::{Error, Result};
