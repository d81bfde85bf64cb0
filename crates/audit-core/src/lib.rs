//! Core library for weighted audit templates and audit execution: the
//! template authoring store with derived weight maintenance, draft/persisted
//! identity handling against a remote store, debounced response autosave, and
//! the scoring/report projection.

pub mod audits;
pub mod config;
pub mod error;
pub mod telemetry;
pub mod templates;

pub use error::{AppError, RemoteError};
