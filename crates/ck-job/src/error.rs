//! Job-subsystem error type, in the same one-enum-per-crate shape as
//! `dt-spatial::SpatialError` / `dt-schedule::ScheduleError`.

use thiserror::Error;

use ck_ecs::EcsError;
use ck_schema::SchemaError;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("No job with id {0}")]
    UnknownJob(u64),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("a reservation is already in progress for job {0}")]
    AlreadyReserving(u64),

    #[error("plugin error: {0}")]
    Plugin(String),

    #[error("insufficient resources")]
    InsufficientResources,

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Ecs(#[from] EcsError),
}

pub type JobResult<T> = Result<T, JobError>;
