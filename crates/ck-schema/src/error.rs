//! Schema-subsystem error type, in the same one-enum-per-crate shape as
//! `dt-spatial::SpatialError` / `dt-schedule::ScheduleError`.

use ck_core::PathSegment;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema directory not found: {0}")]
    DirectoryMissing(PathBuf),

    #[error("malformed schema file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("unknown component kind: {0}")]
    UnknownKind(String),

    #[error("{kind} at {}: expected {expected}, got {actual}", ck_core::format_path(path))]
    Violation {
        kind: String,
        path: Vec<PathSegment>,
        expected: String,
        actual: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SchemaError {
    /// Human-readable `.a.b[0]`-style rendering of the violation path, or
    /// an empty string for non-`Violation` variants.
    pub fn path_string(&self) -> String {
        match self {
            SchemaError::Violation { path, .. } => ck_core::format_path(path),
            _ => String::new(),
        }
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
