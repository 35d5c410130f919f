//! Async HTTP client for the Anthropic Messages API.

use std::time::Duration;

use cal_core::extract::{Extraction, ExtractionRequest, Extractor};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{Error, Result, prompt::build_prompt, response::parse_response};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Connection settings for the extraction model.
#[derive(Clone)]
pub struct ExtractorConfig {
  pub api_key:    String,
  pub base_url:   String,
  pub model:      String,
  pub max_tokens: u32,
  /// Transport-level timeout for a single request.
  pub timeout:    Duration,
}

impl Default for ExtractorConfig {
  fn default() -> Self {
    Self {
      api_key:    String::new(),
      base_url:   "https://api.anthropic.com".to_owned(),
      model:      "claude-3-5-sonnet-20241022".to_owned(),
      max_tokens: 1024,
      timeout:    Duration::from_secs(30),
    }
  }
}

impl std::fmt::Debug for ExtractorConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("ExtractorConfig")
      .field("api_key", &"<redacted>")
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("max_tokens", &self.max_tokens)
      .field("timeout", &self.timeout)
      .finish()
  }
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct MessagesRequest<'a> {
  model:       &'a str,
  max_tokens:  u32,
  temperature: f32,
  messages:    [Message<'a>; 1],
}

#[derive(Serialize)]
struct Message<'a> {
  role:    &'static str,
  content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
  #[serde(default)]
  content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
  #[serde(rename = "type")]
  kind: String,
  #[serde(default)]
  text: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Extraction gateway that asks a Claude model to structure each message.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone, Debug)]
pub struct AnthropicExtractor {
  client: Client,
  config: ExtractorConfig,
}

impl AnthropicExtractor {
  pub fn new(config: ExtractorConfig) -> Result<Self> {
    if config.api_key.trim().is_empty() {
      return Err(Error::MissingApiKey);
    }
    let client = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { client, config })
  }

  pub fn config(&self) -> &ExtractorConfig { &self.config }

  fn url(&self) -> String {
    format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
  }

  /// Send one prompt and return the concatenated text of the answer.
  async fn complete(&self, prompt: &str) -> Result<String> {
    let body = MessagesRequest {
      model:       &self.config.model,
      max_tokens:  self.config.max_tokens,
      temperature: 0.0,
      messages:    [Message { role: "user", content: prompt }],
    };

    let resp = self
      .client
      .post(self.url())
      .header("x-api-key", &self.config.api_key)
      .header("anthropic-version", ANTHROPIC_VERSION)
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      warn!(%status, "extraction model request failed");
      return Err(Error::Status { status, body });
    }

    let parsed: MessagesResponse = resp.json().await?;
    let text: String = parsed
      .content
      .into_iter()
      .filter(|block| block.kind == "text")
      .map(|block| block.text)
      .collect();

    if text.trim().is_empty() {
      return Err(Error::EmptyResponse);
    }
    Ok(text)
  }
}

impl Extractor for AnthropicExtractor {
  type Error = Error;

  async fn extract(&self, request: &ExtractionRequest) -> Result<Extraction> {
    let prompt = build_prompt(request);
    let answer = self.complete(&prompt).await?;
    debug!(model = %self.config.model, answer_len = answer.len(), "extraction answer received");
    parse_response(&answer, request)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::{Arc, Mutex};

  use axum::{Json, Router, http::HeaderMap, http::StatusCode, routing::post};
  use cal_core::field::TextField;
  use chrono::{DateTime, NaiveDate};
  use serde_json::{Value, json};

  use super::*;

  /// Serve `reply` for every `POST /v1/messages`, recording request bodies.
  async fn mock_model(
    status: StatusCode,
    reply: Value,
  ) -> (String, Arc<Mutex<Vec<(HeaderMap, Value)>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_handler = seen.clone();
    let app = Router::new().route(
      "/v1/messages",
      post(move |headers: HeaderMap, Json(body): Json<Value>| {
        let seen = seen_handler.clone();
        let reply = reply.clone();
        async move {
          seen.lock().unwrap().push((headers, body));
          (status, Json(reply))
        }
      }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), seen)
  }

  fn extractor(base_url: String) -> AnthropicExtractor {
    AnthropicExtractor::new(ExtractorConfig {
      api_key: "test-key".into(),
      base_url,
      ..ExtractorConfig::default()
    })
    .unwrap()
  }

  fn request() -> ExtractionRequest {
    let now = DateTime::parse_from_rfc3339("2024-01-02T09:00:00+00:00").unwrap();
    ExtractionRequest::new("had eggs for breakfast", now)
  }

  #[test]
  fn missing_api_key_is_rejected() {
    let err = AnthropicExtractor::new(ExtractorConfig::default()).unwrap_err();
    assert!(matches!(err, Error::MissingApiKey));
  }

  #[test]
  fn debug_output_hides_api_key() {
    let config = ExtractorConfig { api_key: "sk-secret".into(), ..Default::default() };
    assert!(!format!("{config:?}").contains("sk-secret"));
  }

  #[tokio::test]
  async fn extract_sends_prompt_and_parses_answer() {
    let answer = json!({
      "content": [
        { "type": "text", "text": "{\"date\": \"2024-01-02\", \"meals\": {\"breakfast\": \"eggs\"}}" }
      ]
    });
    let (url, seen) = mock_model(StatusCode::OK, answer).await;

    let out = extractor(url).extract(&request()).await.unwrap();
    let record = out.record().expect("a record");
    assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    assert_eq!(
      record.fields.text.get(&TextField::BreakfastDescription).unwrap(),
      "eggs"
    );

    let seen = seen.lock().unwrap();
    let (headers, body) = &seen[0];
    assert_eq!(headers["x-api-key"], "test-key");
    assert_eq!(headers["anthropic-version"], ANTHROPIC_VERSION);
    assert_eq!(body["model"], "claude-3-5-sonnet-20241022");
    assert_eq!(body["temperature"], 0.0);
    let content = body["messages"][0]["content"].as_str().unwrap();
    assert!(content.contains("had eggs for breakfast"));
  }

  #[tokio::test]
  async fn non_success_status_is_an_error() {
    let (url, _) =
      mock_model(StatusCode::TOO_MANY_REQUESTS, json!({ "error": "slow down" })).await;

    let err = extractor(url).extract(&request()).await.unwrap_err();
    assert!(matches!(err, Error::Status { status, .. } if status.as_u16() == 429));
  }

  #[tokio::test]
  async fn answer_without_text_is_an_error() {
    let (url, _) = mock_model(StatusCode::OK, json!({ "content": [] })).await;

    let err = extractor(url).extract(&request()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyResponse));
  }
}
