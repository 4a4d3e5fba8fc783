//! ECS-subsystem error type, in the same one-enum-per-crate shape as
//! `dt-spatial::SpatialError` / `dt-schedule::ScheduleError`.

use thiserror::Error;

use ck_schema::SchemaError;

#[derive(Debug, Error)]
pub enum EcsError {
    #[error("no entity with id {0}")]
    UnknownEntity(u64),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

pub type EcsResult<T> = Result<T, EcsError>;
