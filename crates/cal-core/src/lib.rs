//! Core types and trait definitions for the Cal wellness journal.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the field taxonomy, the per-field merge policy, the merge engine that folds
//! extractions into one row per day, and the submission pipeline that ties
//! the raw log, the extraction gateway and the merge engine together.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod engine;
pub mod error;
pub mod extract;
pub mod field;
pub mod journal;
pub mod merge;
pub mod record;
pub mod store;
pub mod streak;

pub use error::{Error, Result};
