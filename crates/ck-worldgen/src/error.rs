//! Worldgen-subsystem error type, in the same one-enum-per-crate shape as
//! `ck_job::JobError`.

use thiserror::Error;

use ck_schema::SchemaError;

#[derive(Debug, Error)]
pub enum WorldgenError {
    #[error("{0}")]
    ValidationRejected(String),

    #[error("malformed map document: {0}")]
    Malformed(String),

    #[error("plugin error: {0}")]
    Plugin(String),

    #[error("worldgen plugin not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type WorldgenResult<T> = Result<T, WorldgenError>;
