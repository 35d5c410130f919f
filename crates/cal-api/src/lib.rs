//! JSON REST API for Cal.
//!
//! Exposes an axum [`Router`] backed by a [`cal_core::journal::Journal`], so
//! any [`cal_core::store::JournalStore`] and [`cal_core::extract::Extractor`]
//! pair can be served. CORS, tracing and transport concerns are the caller's
//! responsibility.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Liveness message |
//! | `POST` | `/log` | Body: `{"input":"..."}` |
//! | `GET`  | `/view` | All daily aggregates, oldest first; `?format=download` for CSV |
//! | `GET`  | `/view/raw` | All raw messages in append order; `?format=download` for CSV |
//! | `GET`  | `/view/{date}` | One daily aggregate; 404 if absent |
//! | `GET`  | `/recent` | Last messages, today's log and the activity streak |

pub mod error;
pub mod export;
pub mod recent;
pub mod submit;
pub mod view;

use std::sync::Arc;

use axum::{
  Json, Router,
  routing::{get, post},
};
use cal_core::{extract::Extractor, journal::Journal, store::JournalStore};
use serde_json::{Value, json};

pub use error::ApiError;

/// Build a fully-materialised API router for `journal`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, X>(journal: Arc<Journal<S, X>>) -> Router<()>
where
  S: JournalStore + 'static,
  X: Extractor + 'static,
{
  Router::new()
    .route("/", get(root))
    .route("/log", post(submit::handler::<S, X>))
    .route("/view", get(view::list_days::<S, X>))
    .route("/view/raw", get(view::list_messages::<S, X>))
    .route("/view/{date}", get(view::get_day::<S, X>))
    .route("/recent", get(recent::handler::<S, X>))
    .with_state(journal)
}

/// `GET /`
async fn root() -> Json<Value> { Json(json!({ "message": "Cal API is running" })) }
