//! Events-subsystem error type, in the same one-enum-per-crate shape as
//! `dt-output::OutputError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed job event log at {path}: {reason}")]
    Malformed { path: String, reason: String },

    #[error("malformed job event log JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type EventsResult<T> = Result<T, EventsError>;
