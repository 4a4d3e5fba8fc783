//! Map-subsystem error type, in the same one-enum-per-crate shape as
//! `dt-spatial::SpatialError`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type MapResult<T> = Result<T, MapError>;
