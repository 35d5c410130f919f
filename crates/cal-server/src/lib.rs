//! Cal HTTP server: configuration and the fully layered router.
//!
//! The binary in `main.rs` reads a [`ServerConfig`], opens the SQLite store,
//! builds the extraction gateway and serves [`router`].

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use axum::{Router, http::HeaderValue};
use cal_core::{extract::Extractor, journal::Journal, store::JournalStore};
use cal_extract::ExtractorConfig;
use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;
use tower_http::{
  cors::{AllowOrigin, Any, CorsLayer},
  trace::TraceLayer,
};
use tracing::warn;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_FALLBACK_VAR: &str = "ANTHROPIC_API_KEY";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and `CAL_*`
/// environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Origins allowed to call the API from a browser.
  pub cors_origins: Vec<String>,
  pub extraction:   ExtractionConfig,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_string(),
      port:         8000,
      store_path:   PathBuf::from("~/.local/share/cal/cal.db"),
      cors_origins: vec![
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
      ],
      extraction:   ExtractionConfig::default(),
    }
  }
}

/// Settings for the extraction model.
#[derive(Deserialize, Clone)]
#[serde(default)]
pub struct ExtractionConfig {
  pub api_key:      String,
  pub base_url:     String,
  pub model:        String,
  pub max_tokens:   u32,
  /// Upper bound on one extraction call, in seconds.
  pub timeout_secs: u64,
}

impl Default for ExtractionConfig {
  fn default() -> Self {
    let defaults = ExtractorConfig::default();
    Self {
      api_key:      defaults.api_key,
      base_url:     defaults.base_url,
      model:        defaults.model,
      max_tokens:   defaults.max_tokens,
      timeout_secs: defaults.timeout.as_secs(),
    }
  }
}

impl std::fmt::Debug for ExtractionConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let api_key = if self.api_key.is_empty() { "<unset>" } else { "<redacted>" };
    f.debug_struct("ExtractionConfig")
      .field("api_key", &api_key)
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("max_tokens", &self.max_tokens)
      .field("timeout_secs", &self.timeout_secs)
      .finish()
  }
}

impl ExtractionConfig {
  pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }

  pub fn extractor_config(&self) -> ExtractorConfig {
    ExtractorConfig {
      api_key:    self.api_key.clone(),
      base_url:   self.base_url.clone(),
      model:      self.model.clone(),
      max_tokens: self.max_tokens,
      timeout:    self.timeout(),
    }
  }
}

impl ServerConfig {
  /// Load `path` (if it exists) layered under `CAL_*` environment variables.
  ///
  /// Nested keys use `__`, e.g. `CAL_EXTRACTION__MODEL`.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    Self::load_from(File::from(path).required(false))
  }

  fn load_from<F>(file: F) -> Result<Self, ConfigError>
  where
    F: Source + Send + Sync + 'static,
  {
    let settings = Config::builder()
      .add_source(file)
      .add_source(
        Environment::with_prefix("CAL")
          .prefix_separator("_")
          .separator("__")
          .list_separator(",")
          .with_list_parse_key("cors_origins")
          .try_parsing(true),
      )
      .build()?;

    let config: Self = settings.try_deserialize()?;
    Ok(config.with_api_key_fallback(std::env::var(API_KEY_FALLBACK_VAR).ok()))
  }

  /// Use `fallback` as the API key when none was configured.
  pub fn with_api_key_fallback(mut self, fallback: Option<String>) -> Self {
    if self.extraction.api_key.trim().is_empty()
      && let Some(key) = fallback
    {
      self.extraction.api_key = key;
    }
    self
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The API router with request tracing and CORS applied.
pub fn router<S, X>(journal: Arc<Journal<S, X>>, config: &ServerConfig) -> Router
where
  S: JournalStore + 'static,
  X: Extractor + 'static,
{
  cal_api::api_router(journal)
    .layer(cors_layer(&config.cors_origins))
    .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
  let origins: Vec<HeaderValue> = origins
    .iter()
    .filter_map(|o| match HeaderValue::from_str(o) {
      Ok(v) => Some(v),
      Err(_) => {
        warn!(origin = %o, "ignoring invalid CORS origin");
        None
      }
    })
    .collect();

  CorsLayer::new()
    .allow_origin(AllowOrigin::list(origins))
    .allow_methods(Any)
    .allow_headers(Any)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
