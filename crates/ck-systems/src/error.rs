use thiserror::Error;

use ck_ecs::EcsError;
use ck_job::JobError;

#[derive(Debug, Error)]
pub enum SystemError {
    #[error("no system registered under the name {0:?}")]
    UnknownSystem(String),
    #[error(transparent)]
    Job(#[from] JobError),
    #[error(transparent)]
    Ecs(#[from] EcsError),
}

pub type SystemResult<T> = Result<T, SystemError>;
