//! cal server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `CAL_*` environment variables, opens the SQLite store and serves the
//! journal API over HTTP.
//!
//! # Checking the configuration
//!
//! ```
//! cargo run -p cal-server --bin server -- --check-config
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use cal_core::journal::Journal;
use cal_extract::AnthropicExtractor;
use cal_server::ServerConfig;
use cal_store_sqlite::SqliteStore;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cal wellness journal server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the resolved configuration (API key redacted) and exit.
  #[arg(long)]
  check_config: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let server_cfg = ServerConfig::load(&cli.config)
    .with_context(|| format!("failed to load configuration from {:?}", cli.config))?;

  if cli.check_config {
    println!("{server_cfg:#?}");
    return Ok(());
  }

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let extractor = AnthropicExtractor::new(server_cfg.extraction.extractor_config())
    .context("failed to set up the extraction model client")?;

  let journal = Journal::new(Arc::new(store), Arc::new(extractor))
    .with_timeout(server_cfg.extraction.timeout());

  let app = cal_server::router(Arc::new(journal), &server_cfg);
  let address = server_cfg.address();

  tracing::info!(store = ?store_path, model = %server_cfg.extraction.model, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
